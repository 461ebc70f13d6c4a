/// Input validation utilities
use chrono::{DateTime, Utc};
use regex::Regex;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Only absolute http(s) URLs are accepted
pub fn is_valid_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Dates are stored in UTC so that stored strings order chronologically;
/// unparseable input is kept as is for validation to report
pub fn normalize_date(value: &str) -> String {
    let value = value.trim();
    parse_date(value)
        .map(|date| date.to_rfc3339())
        .unwrap_or_else(|| value.to_string())
}

pub fn is_valid_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// Optional fields are valid when absent
pub fn optional_is<F: Fn(&str) -> bool>(value: &Option<String>, check: F) -> bool {
    value.as_deref().is_none_or(check)
}

/// Returns true when the list holds the same value twice
pub fn has_duplicates(values: &[String]) -> bool {
    let mut seen = std::collections::HashSet::new();
    values.iter().any(|value| !seen.insert(value.as_str()))
}
