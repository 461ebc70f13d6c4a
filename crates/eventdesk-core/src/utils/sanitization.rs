/// Text and HTML sanitization applied when loading client input
use crate::constants::MAX_SHORT_TEXT_LENGTH;

/// Removes scripts, event handlers and other unsafe markup from rich text
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

/// Trims a plain-text field, strips control characters and caps its length
pub fn clean_text(value: &str) -> String {
    clean_text_with_limit(value, MAX_SHORT_TEXT_LENGTH)
}

pub fn clean_text_with_limit(value: &str, limit: usize) -> String {
    let filtered: String = value
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect();
    filtered.trim().chars().take(limit).collect()
}

/// Cleans an optional field, turning blank values into `None`
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| clean_text_with_limit(&v, crate::constants::MAX_LONG_TEXT_LENGTH))
        .filter(|v| !v.is_empty())
}

/// Sanitizes a user-controlled S3 key component to prevent path traversal
///
/// # Examples
/// ```
/// use eventdesk_core::utils::sanitization::sanitize_path_component;
///
/// assert_eq!(sanitize_path_component("../../../etc/passwd"), "etcpasswd");
/// assert_eq!(sanitize_path_component("spot-123"), "spot-123");
/// ```
pub fn sanitize_path_component(input: &str) -> String {
    let filtered: String = input
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .take(255)
        .collect();

    let mut result = String::with_capacity(filtered.len());
    let mut last_was_dot = false;
    for c in filtered.chars() {
        if c == '.' {
            if !last_was_dot {
                result.push(c);
            }
            last_was_dot = true;
        } else {
            result.push(c);
            last_was_dot = false;
        }
    }

    result.trim_matches('.').to_string()
}
