/// Room endpoints
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventdesk_core::models::{Resource, Room, Session, Venue, new_id};
use std::sync::Arc;
use tracing::info;

use super::{Payload, resolve};
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

/// Validates the room and embeds the current form of its venue
async fn link_venue(ctx: &ApiContext, room: Room) -> Result<Room, ApiError> {
    room.validate()?;
    let venue: Venue = resolve(&ctx.repo, &Venue::key_for(&room.venue.venue_id)).await?;
    Ok(Room {
        venue: venue.linked(),
        ..room
    })
}

pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let mut rooms = ctx.repo.list::<Room>().await?;
    rooms.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(rooms))
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(ctx.repo.load(&Room::key_for(&id)).await?))
}

pub async fn create(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(room): Payload<Room>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    principal.require_content_manager()?;

    let room = Room {
        room_id: new_id(),
        ..room.cleaned()
    };
    let room = link_venue(&ctx, room).await?;
    ctx.repo.create(&room).await?;

    info!(room_id = %room.room_id, venue_id = %room.venue.venue_id, "Created room");
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn update(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(room): Payload<Room>,
) -> Result<Json<Room>, ApiError> {
    principal.require_content_manager()?;

    let existing: Room = ctx.repo.load(&Room::key_for(&id)).await?;
    let room = link_venue(&ctx, room.safe_load(&existing)).await?;
    ctx.repo.save(&room).await?;

    Ok(Json(room))
}

pub async fn delete(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_content_manager()?;

    let sessions = ctx.repo.list::<Session>().await?;
    if sessions.iter().any(|session| session.room.room_id == id) {
        return Err(ApiError::Conflict(
            "Room is still used by a session".to_string(),
        ));
    }

    ctx.repo.remove::<Room>(&Room::key_for(&id)).await?;
    info!(room_id = %id, "Deleted room");
    Ok(StatusCode::NO_CONTENT)
}
