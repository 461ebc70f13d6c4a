/// Application constants
///
/// Hardcoded values used across the backend, grouped by concern.
// ============================================================================
// Configuration Constants
// ============================================================================
/// Fixed id of the single platform configuration item
pub const CONFIGURATION_ID: &str = "CONFIG";

/// Timezone used when no configuration has been stored yet
pub const DEFAULT_TIMEZONE: &str = "Europe/Brussels";

/// Default lifetime of signed media URLs in seconds
pub const DEFAULT_SIGNED_URL_EXPIRATION_SECONDS: u64 = 300;

// ============================================================================
// Identity Constants
// ============================================================================

/// Cognito group granting every permission
pub const GROUP_ADMINS: &str = "admins";

/// Cognito group allowed to manage contents (sessions, speakers, venues, ...)
pub const GROUP_CONTENT_MANAGERS: &str = "contentManagers";

/// Cognito group allowed to manage registrations and spots
pub const GROUP_REGISTRATION_MANAGERS: &str = "registrationManagers";

/// Cognito group of the country delegation leaders
pub const GROUP_COUNTRY_LEADERS: &str = "countryLeaders";

// ============================================================================
// Limits
// ============================================================================

/// Maximum number of spots created by a single request
pub const MAX_SPOTS_PER_REQUEST: u32 = 250;

/// Maximum length of a plain-text field (names, titles, codes)
pub const MAX_SHORT_TEXT_LENGTH: usize = 200;

/// Maximum length of a rich-text field (descriptions, contents)
pub const MAX_LONG_TEXT_LENGTH: usize = 20_000;

// ============================================================================
// Storage Constants
// ============================================================================

/// Secondary index of the session registrations table, keyed by user
pub const REGISTRATIONS_BY_USER_INDEX: &str = "userId-sessionId-index";

/// S3 prefix of uploaded images
pub const IMAGES_PREFIX: &str = "images";

/// S3 prefix of uploaded proofs of payment
pub const PROOFS_PREFIX: &str = "proofs";
