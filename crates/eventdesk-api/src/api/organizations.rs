/// Organization endpoints
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventdesk_core::models::{Organization, Resource, Speaker, new_id};
use std::sync::Arc;
use tracing::info;

use super::Payload;
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
) -> Result<Json<Vec<Organization>>, ApiError> {
    let mut organizations = ctx.repo.list::<Organization>().await?;
    organizations.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(organizations))
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<Organization>, ApiError> {
    Ok(Json(ctx.repo.load(&Organization::key_for(&id)).await?))
}

pub async fn create(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(organization): Payload<Organization>,
) -> Result<(StatusCode, Json<Organization>), ApiError> {
    principal.require_content_manager()?;

    let organization = Organization {
        organization_id: new_id(),
        ..organization.cleaned()
    };
    organization.validate()?;
    ctx.repo.create(&organization).await?;

    info!(organization_id = %organization.organization_id, "Created organization");
    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn update(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(organization): Payload<Organization>,
) -> Result<Json<Organization>, ApiError> {
    principal.require_content_manager()?;

    let existing: Organization = ctx.repo.load(&Organization::key_for(&id)).await?;
    let organization = organization.safe_load(&existing);
    organization.validate()?;
    ctx.repo.save(&organization).await?;

    Ok(Json(organization))
}

pub async fn delete(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_content_manager()?;

    let speakers = ctx.repo.list::<Speaker>().await?;
    if speakers
        .iter()
        .any(|speaker| speaker.organization.organization_id == id)
    {
        return Err(ApiError::Conflict(
            "Organization is still used by a speaker".to_string(),
        ));
    }

    ctx.repo
        .remove::<Organization>(&Organization::key_for(&id))
        .await?;
    info!(organization_id = %id, "Deleted organization");
    Ok(StatusCode::NO_CONTENT)
}
