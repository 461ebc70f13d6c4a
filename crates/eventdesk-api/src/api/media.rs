/// Media upload endpoints
use axum::{Extension, Json, extract::State};
use eventdesk_core::services::media::image_key;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::Payload;
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub content_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    pub key: String,
    /// Signed URL to `PUT` the image to
    pub upload_url: String,
    /// Public URL of the image once uploaded
    pub url: String,
}

pub async fn image_upload_url(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(request): Payload<UploadRequest>,
) -> Result<Json<ImageUpload>, ApiError> {
    let key = image_key(&request.content_type)?;
    let upload_url = ctx.media.upload_url(&key, &request.content_type).await?;

    info!(user_id = %principal.user_id, key = %key, "Issued image upload URL");
    Ok(Json(ImageUpload {
        url: ctx.media.public_url(&key),
        key,
        upload_url,
    }))
}
