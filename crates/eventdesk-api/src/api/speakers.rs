/// Speaker endpoints
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventdesk_core::models::{Organization, Resource, Session, Speaker, new_id};
use std::sync::Arc;
use tracing::info;

use super::{Payload, resolve};
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

/// Validates the speaker and embeds the current form of their organization
async fn link_organization(ctx: &ApiContext, speaker: Speaker) -> Result<Speaker, ApiError> {
    speaker.validate()?;
    let organization: Organization = resolve(
        &ctx.repo,
        &Organization::key_for(&speaker.organization.organization_id),
    )
    .await?;
    Ok(Speaker {
        organization: organization.linked(),
        ..speaker
    })
}

pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
) -> Result<Json<Vec<Speaker>>, ApiError> {
    let mut speakers = ctx.repo.list::<Speaker>().await?;
    speakers.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(speakers))
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<Speaker>, ApiError> {
    Ok(Json(ctx.repo.load(&Speaker::key_for(&id)).await?))
}

pub async fn create(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(speaker): Payload<Speaker>,
) -> Result<(StatusCode, Json<Speaker>), ApiError> {
    principal.require_content_manager()?;

    let speaker = Speaker {
        speaker_id: new_id(),
        ..speaker.cleaned()
    };
    let speaker = link_organization(&ctx, speaker).await?;
    ctx.repo.create(&speaker).await?;

    info!(speaker_id = %speaker.speaker_id, "Created speaker");
    Ok((StatusCode::CREATED, Json(speaker)))
}

pub async fn update(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(speaker): Payload<Speaker>,
) -> Result<Json<Speaker>, ApiError> {
    principal.require_content_manager()?;

    let existing: Speaker = ctx.repo.load(&Speaker::key_for(&id)).await?;
    let speaker = link_organization(&ctx, speaker.safe_load(&existing)).await?;
    ctx.repo.save(&speaker).await?;

    Ok(Json(speaker))
}

pub async fn delete(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_content_manager()?;

    let sessions = ctx.repo.list::<Session>().await?;
    if sessions.iter().any(|session| session.has_speaker(&id)) {
        return Err(ApiError::Conflict(
            "Speaker is still used by a session".to_string(),
        ));
    }

    ctx.repo.remove::<Speaker>(&Speaker::key_for(&id)).await?;
    info!(speaker_id = %id, "Deleted speaker");
    Ok(StatusCode::NO_CONTENT)
}
