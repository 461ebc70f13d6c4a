/// Communication endpoints
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventdesk_core::models::{Communication, Resource, new_id};
use eventdesk_core::utils::parse_date;
use std::sync::Arc;
use tracing::info;

use super::Payload;
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

/// All communications, newest first
pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
) -> Result<Json<Vec<Communication>>, ApiError> {
    let mut communications = ctx.repo.list::<Communication>().await?;
    communications.sort_by_key(|c| std::cmp::Reverse(parse_date(&c.date)));
    Ok(Json(communications))
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<Communication>, ApiError> {
    Ok(Json(ctx.repo.load(&Communication::key_for(&id)).await?))
}

pub async fn create(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(communication): Payload<Communication>,
) -> Result<(StatusCode, Json<Communication>), ApiError> {
    principal.require_content_manager()?;

    let communication = Communication {
        communication_id: new_id(),
        ..communication.cleaned()
    };
    communication.validate()?;
    ctx.repo.create(&communication).await?;

    info!(communication_id = %communication.communication_id, "Created communication");
    Ok((StatusCode::CREATED, Json(communication)))
}

pub async fn update(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(communication): Payload<Communication>,
) -> Result<Json<Communication>, ApiError> {
    principal.require_content_manager()?;

    let existing: Communication = ctx.repo.load(&Communication::key_for(&id)).await?;
    let communication = communication.safe_load(&existing);
    communication.validate()?;
    ctx.repo.save(&communication).await?;

    Ok(Json(communication))
}

pub async fn delete(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_content_manager()?;

    ctx.repo
        .remove::<Communication>(&Communication::key_for(&id))
        .await?;
    info!(communication_id = %id, "Deleted communication");
    Ok(StatusCode::NO_CONTENT)
}
