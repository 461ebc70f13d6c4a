/// Error types for the EventDesk system
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventDeskError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl EventDeskError {
    /// Shorthand for an invalid-fields validation error
    pub fn invalid_fields(fields: &[&str]) -> Self {
        Self::Validation(format!("Invalid fields: {}", fields.join(", ")))
    }
}

impl From<serde_json::Error> for EventDeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<std::env::VarError> for EventDeskError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}
