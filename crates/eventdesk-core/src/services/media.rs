/// Media storage on S3: images and proofs of payment
use crate::constants::{IMAGES_PREFIX, PROOFS_PREFIX};
use crate::error::EventDeskError;
use crate::utils::sanitize_path_component;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Signed URL the client uses to `PUT` the object directly
    async fn upload_url(&self, key: &str, content_type: &str) -> Result<String, EventDeskError>;

    /// Signed URL to read a private object
    async fn download_url(&self, key: &str) -> Result<String, EventDeskError>;

    /// Unsigned URL of a publicly readable object
    fn public_url(&self, key: &str) -> String;

    async fn delete(&self, key: &str) -> Result<(), EventDeskError>;
}

pub struct S3MediaStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    base_url: String,
    expiration: Duration,
}

impl S3MediaStorage {
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: impl Into<String>,
        base_url: impl Into<String>,
        expiration: Duration,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            base_url: base_url.into(),
            expiration,
        }
    }

    fn presigning_config(
        &self,
    ) -> Result<aws_sdk_s3::presigning::PresigningConfig, EventDeskError> {
        aws_sdk_s3::presigning::PresigningConfig::expires_in(self.expiration)
            .map_err(|e| EventDeskError::Storage(format!("Invalid expiration duration: {}", e)))
    }
}

#[async_trait]
impl MediaStorage for S3MediaStorage {
    async fn upload_url(&self, key: &str, content_type: &str) -> Result<String, EventDeskError> {
        let presigned_request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(self.presigning_config()?)
            .await
            .map_err(|e| {
                EventDeskError::Storage(format!("Failed to generate upload URL: {}", e))
            })?;

        tracing::debug!(bucket = %self.bucket, key = %key, "Generated upload URL");
        Ok(presigned_request.uri().to_string())
    }

    async fn download_url(&self, key: &str) -> Result<String, EventDeskError> {
        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(self.presigning_config()?)
            .await
            .map_err(|e| {
                EventDeskError::Storage(format!("Failed to generate download URL: {}", e))
            })?;

        Ok(presigned_request.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    async fn delete(&self, key: &str) -> Result<(), EventDeskError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| EventDeskError::Storage(format!("S3 delete failed: {}", e)))?;

        tracing::info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

/// File extension for an accepted upload type
fn extension_for(content_type: &mime::Mime) -> Option<&'static str> {
    let subtype = content_type.subtype();
    if content_type.type_() == mime::APPLICATION {
        return (subtype == mime::PDF).then_some("pdf");
    }
    if content_type.type_() != mime::IMAGE {
        return None;
    }

    match subtype.as_str() {
        "jpeg" | "jpg" => Some("jpg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        _ => None,
    }
}

fn parse_content_type(content_type: &str) -> Result<mime::Mime, EventDeskError> {
    content_type
        .trim()
        .parse::<mime::Mime>()
        .map_err(|_| EventDeskError::Validation(format!("Invalid content type: {}", content_type)))
}

/// Object key of a new image; only image types are accepted
pub fn image_key(content_type: &str) -> Result<String, EventDeskError> {
    let parsed = parse_content_type(content_type)?;
    match extension_for(&parsed) {
        Some(extension) if parsed.type_() == mime::IMAGE => Ok(format!(
            "{}/{}.{}",
            IMAGES_PREFIX,
            uuid::Uuid::new_v4(),
            extension
        )),
        _ => Err(EventDeskError::Validation(format!(
            "Unsupported image type: {}",
            content_type
        ))),
    }
}

/// Object key of a proof of payment for a spot; images and PDFs are accepted
pub fn proof_key(spot_id: &str, content_type: &str) -> Result<String, EventDeskError> {
    let parsed = parse_content_type(content_type)?;
    let extension = extension_for(&parsed).ok_or_else(|| {
        EventDeskError::Validation(format!("Unsupported proof type: {}", content_type))
    })?;

    Ok(format!(
        "{}/{}/{}.{}",
        PROOFS_PREFIX,
        sanitize_path_component(spot_id),
        uuid::Uuid::new_v4(),
        extension
    ))
}

/// Whether a key points into a spot's proof folder
pub fn is_proof_key_of(spot_id: &str, key: &str) -> bool {
    let prefix = format!("{}/{}/", PROOFS_PREFIX, sanitize_path_component(spot_id));
    key.strip_prefix(&prefix)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/') && !rest.contains(".."))
}
