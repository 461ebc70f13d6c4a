/// Venue endpoints
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventdesk_core::models::{Resource, Room, Venue, new_id};
use std::sync::Arc;
use tracing::info;

use super::Payload;
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
) -> Result<Json<Vec<Venue>>, ApiError> {
    let mut venues = ctx.repo.list::<Venue>().await?;
    venues.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(venues))
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<Venue>, ApiError> {
    Ok(Json(ctx.repo.load(&Venue::key_for(&id)).await?))
}

pub async fn create(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(venue): Payload<Venue>,
) -> Result<(StatusCode, Json<Venue>), ApiError> {
    principal.require_content_manager()?;

    let venue = Venue {
        venue_id: new_id(),
        ..venue.cleaned()
    };
    venue.validate()?;
    ctx.repo.create(&venue).await?;

    info!(venue_id = %venue.venue_id, "Created venue");
    Ok((StatusCode::CREATED, Json(venue)))
}

pub async fn update(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(venue): Payload<Venue>,
) -> Result<Json<Venue>, ApiError> {
    principal.require_content_manager()?;

    let existing: Venue = ctx.repo.load(&Venue::key_for(&id)).await?;
    let venue = venue.safe_load(&existing);
    venue.validate()?;
    ctx.repo.save(&venue).await?;

    Ok(Json(venue))
}

pub async fn delete(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_content_manager()?;

    let rooms = ctx.repo.list::<Room>().await?;
    if rooms.iter().any(|room| room.venue.venue_id == id) {
        return Err(ApiError::Conflict(
            "Venue is still used by a room".to_string(),
        ));
    }

    ctx.repo.remove::<Venue>(&Venue::key_for(&id)).await?;
    info!(venue_id = %id, "Deleted venue");
    Ok(StatusCode::NO_CONTENT)
}
