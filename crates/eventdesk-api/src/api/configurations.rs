/// Platform configuration endpoints
use axum::{Extension, Json, extract::State};
use eventdesk_core::models::{Configuration, Resource};
use eventdesk_core::services::Repository;
use std::sync::Arc;
use tracing::info;

use super::Payload;
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

/// The stored configuration, or the default one when none was saved yet
pub async fn current(repo: &Repository) -> Result<Configuration, ApiError> {
    Ok(repo
        .get::<Configuration>(&Configuration::key_for())
        .await?
        .unwrap_or_default())
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
) -> Result<Json<Configuration>, ApiError> {
    Ok(Json(current(&ctx.repo).await?))
}

pub async fn put(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(configuration): Payload<Configuration>,
) -> Result<Json<Configuration>, ApiError> {
    principal.require_admin()?;

    let configuration = configuration.cleaned();
    configuration.validate()?;
    ctx.repo.upsert(&configuration).await?;

    info!(
        user_id = %principal.user_id,
        registration_open = configuration.is_registration_open,
        "Updated configuration"
    );
    Ok(Json(configuration))
}
