/// Session endpoints and session registrations
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eventdesk_core::EventDeskError;
use eventdesk_core::auth::Principal;
use eventdesk_core::constants::REGISTRATIONS_BY_USER_INDEX;
use eventdesk_core::models::{
    Resource, Room, Session, SessionRegistration, Speaker, SpeakerLinked, User, new_id, now,
};
use eventdesk_core::services::{Condition, Counter};
use eventdesk_core::utils::parse_date;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{Payload, resolve};
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

const PARTICIPANTS: &str = "numberOfParticipants";
const LIMIT: &str = "limitOfParticipants";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilter {
    pub room_id: Option<String>,
    pub speaker_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionAction {
    Register,
    Unregister,
}

/// Validates the session and embeds the current forms of its room and speakers
async fn link_references(ctx: &ApiContext, session: Session) -> Result<Session, ApiError> {
    session.validate()?;

    let room: Room = resolve(&ctx.repo, &Room::key_for(&session.room.room_id)).await?;
    let mut speakers: Vec<SpeakerLinked> = Vec::with_capacity(session.speakers.len());
    for linked in &session.speakers {
        let speaker: Speaker = resolve(&ctx.repo, &Speaker::key_for(&linked.speaker_id)).await?;
        if !speakers.iter().any(|s| s.speaker_id == speaker.speaker_id) {
            speakers.push(speaker.linked());
        }
    }

    Ok(Session {
        room: room.linked(),
        speakers,
        ..session
    })
}

/// Sessions in chronological order, optionally restricted to a room or a speaker
pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
    Query(filter): Query<SessionFilter>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let mut sessions: Vec<Session> = ctx
        .repo
        .list::<Session>()
        .await?
        .into_iter()
        .filter(|session| {
            filter
                .room_id
                .as_ref()
                .is_none_or(|room_id| session.room.room_id == *room_id)
        })
        .filter(|session| {
            filter
                .speaker_id
                .as_ref()
                .is_none_or(|speaker_id| session.has_speaker(speaker_id))
        })
        .collect();
    sessions.sort_by(|a, b| a.starts_at_date().cmp(&b.starts_at_date()));

    Ok(Json(sessions))
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(ctx.repo.load(&Session::key_for(&id)).await?))
}

pub async fn create(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(session): Payload<Session>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    principal.require_content_manager()?;

    let session = Session {
        session_id: new_id(),
        number_of_participants: 0,
        ..session
    }
    .cleaned();
    let session = link_references(&ctx, session).await?;
    ctx.repo.create(&session).await?;

    info!(session_id = %session.session_id, code = %session.code, "Created session");
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn update(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(session): Payload<Session>,
) -> Result<Json<Session>, ApiError> {
    principal.require_content_manager()?;

    let existing: Session = ctx.repo.load(&Session::key_for(&id)).await?;
    let session = link_references(&ctx, session.safe_load(&existing)).await?;

    // The counter may have moved since it was read; never overwrite it
    ctx.repo
        .transact(vec![ctx.repo.put_op(
            &session,
            Condition::equals(PARTICIPANTS, existing.number_of_participants),
        )?])
        .await
        .map_err(|e| match e {
            EventDeskError::Conflict(_) => ApiError::Conflict(
                "Registrations changed meanwhile, please retry".to_string(),
            ),
            other => other.into(),
        })?;

    Ok(Json(session))
}

pub async fn delete(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_content_manager()?;

    let registrations = ctx
        .repo
        .query::<SessionRegistration>(None, "sessionId", &id)
        .await?;
    if !registrations.is_empty() {
        return Err(ApiError::Conflict(
            "The session still has registrations".to_string(),
        ));
    }

    ctx.repo.remove::<Session>(&Session::key_for(&id)).await?;
    info!(session_id = %id, "Deleted session");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn patch(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(action): Payload<SessionAction>,
) -> Result<Json<Session>, ApiError> {
    let session: Session = ctx.repo.load(&Session::key_for(&id)).await?;
    let user: User = ctx
        .repo
        .get(&User::key_for(&principal.user_id))
        .await?
        .ok_or_else(|| ApiError::BadRequest("Create your profile first".to_string()))?;

    match action {
        SessionAction::Register => register(&ctx, &principal, &session, &user).await?,
        SessionAction::Unregister => unregister(&ctx, &principal, &session).await?,
    }

    Ok(Json(ctx.repo.load(&Session::key_for(&id)).await?))
}

async fn register(
    ctx: &ApiContext,
    principal: &Principal,
    session: &Session,
    user: &User,
) -> Result<(), ApiError> {
    if !session.requires_registration {
        return Err(ApiError::BadRequest(
            "The session doesn't require registration".to_string(),
        ));
    }

    let mine = ctx
        .repo
        .query::<SessionRegistration>(
            Some(REGISTRATIONS_BY_USER_INDEX),
            "userId",
            &principal.user_id,
        )
        .await?;
    if mine.iter().any(|r| r.session_id == session.session_id) {
        return Err(ApiError::Conflict("Already registered".to_string()));
    }
    if mine.iter().any(|r| r.overlaps(session)) {
        return Err(ApiError::Conflict(
            "You're registered to an overlapping session".to_string(),
        ));
    }
    if session.is_full() {
        return Err(ApiError::Conflict("The session is full".to_string()));
    }

    let registration = SessionRegistration {
        session_id: session.session_id.clone(),
        user_id: principal.user_id.clone(),
        session_date: session.session_date.clone(),
        ends_at: session.ends_at.clone(),
        section_country: user.section_country.clone(),
        registered_at: now(),
    };

    ctx.repo
        .transact(vec![
            ctx.repo.put_op(&registration, Condition::NotExists)?,
            ctx.repo.increment_op::<Session>(
                session.key(),
                Counter::attribute(PARTICIPANTS),
                1,
                Condition::less_than(PARTICIPANTS, LIMIT),
            ),
        ])
        .await
        .map_err(|e| match e {
            EventDeskError::Conflict(_) => {
                ApiError::Conflict("The session is full or you're already registered".to_string())
            }
            other => other.into(),
        })?;

    info!(
        session_id = %session.session_id,
        user_id = %principal.user_id,
        "Registered to session"
    );
    Ok(())
}

async fn unregister(
    ctx: &ApiContext,
    principal: &Principal,
    session: &Session,
) -> Result<(), ApiError> {
    let key = SessionRegistration::key_for(&session.session_id, &principal.user_id);

    ctx.repo
        .transact(vec![
            ctx.repo
                .delete_op::<SessionRegistration>(key, Condition::Exists),
            ctx.repo.increment_op::<Session>(
                session.key(),
                Counter::attribute(PARTICIPANTS),
                -1,
                Condition::Exists,
            ),
        ])
        .await
        .map_err(|e| match e {
            EventDeskError::Conflict(_) => {
                ApiError::Conflict("You're not registered to this session".to_string())
            }
            other => other.into(),
        })?;

    info!(
        session_id = %session.session_id,
        user_id = %principal.user_id,
        "Unregistered from session"
    );
    Ok(())
}

/// Everyone registered to a session
pub async fn registrations(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SessionRegistration>>, ApiError> {
    if !principal.permissions.can_manage_contents {
        principal.require_registration_manager()?;
    }

    let _session: Session = ctx.repo.load(&Session::key_for(&id)).await?;
    let mut registrations = ctx
        .repo
        .query::<SessionRegistration>(None, "sessionId", &id)
        .await?;
    registrations.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));

    Ok(Json(registrations))
}

/// The caller's registrations, in chronological order of the sessions
pub async fn my_registrations(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
) -> Result<Json<Vec<SessionRegistration>>, ApiError> {
    let mut registrations = ctx
        .repo
        .query::<SessionRegistration>(
            Some(REGISTRATIONS_BY_USER_INDEX),
            "userId",
            &principal.user_id,
        )
        .await?;
    registrations.sort_by_key(|r| parse_date(&r.session_date));

    Ok(Json(registrations))
}
