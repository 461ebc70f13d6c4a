/// Deployment configuration, loaded from environment variables
use crate::constants::DEFAULT_SIGNED_URL_EXPIRATION_SECONDS;
use crate::error::EventDeskError;
use crate::utils::{is_blank, is_valid_email};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// DynamoDB table names are `<table_prefix>_<resource>`
    pub table_prefix: String,
    pub media_bucket: String,
    /// Public base URL of the uploaded images
    pub media_base_url: String,
    pub sender_email: String,
    /// Front-end URL linked from the notification emails
    pub app_url: Option<String>,
    pub user_pool_id: String,
    pub signed_url_expiration: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, EventDeskError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EventDeskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !is_blank(value))
                .ok_or_else(|| EventDeskError::Config(format!("Missing {} env var", name)))
        };

        let media_bucket = required("MEDIA_BUCKET")?;
        let media_base_url = lookup("MEDIA_BASE_URL")
            .filter(|value| !is_blank(value))
            .unwrap_or_else(|| format!("https://{}.s3.amazonaws.com", media_bucket));

        let signed_url_expiration = match lookup("SIGNED_URL_EXPIRATION_SECONDS") {
            Some(value) => value.trim().parse().map_err(|_| {
                EventDeskError::Config(format!(
                    "Invalid SIGNED_URL_EXPIRATION_SECONDS: {}",
                    value
                ))
            })?,
            None => DEFAULT_SIGNED_URL_EXPIRATION_SECONDS,
        };

        let config = Self {
            table_prefix: required("TABLE_PREFIX")?,
            media_bucket,
            media_base_url: media_base_url.trim_end_matches('/').to_string(),
            sender_email: required("SENDER_EMAIL")?,
            app_url: lookup("APP_URL").filter(|value| !is_blank(value)),
            user_pool_id: required("USER_POOL_ID")?,
            signed_url_expiration: Duration::from_secs(signed_url_expiration),
        };

        config.validate()?;
        tracing::info!(
            table_prefix = %config.table_prefix,
            media_bucket = %config.media_bucket,
            "Configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EventDeskError> {
        if is_blank(&self.table_prefix) {
            return Err(EventDeskError::Config("Table prefix is empty".to_string()));
        }
        if is_blank(&self.media_bucket) {
            return Err(EventDeskError::Config("Media bucket is empty".to_string()));
        }
        if is_blank(&self.user_pool_id) {
            return Err(EventDeskError::Config("User pool id is empty".to_string()));
        }
        if !is_valid_email(&self.sender_email) {
            return Err(EventDeskError::Config(format!(
                "Invalid sender email: {}",
                self.sender_email
            )));
        }
        if self.signed_url_expiration.is_zero() {
            return Err(EventDeskError::Config(
                "Signed URL expiration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
