/// User profile endpoints
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eventdesk_core::EventDeskError;
use eventdesk_core::auth::{Group, Principal};
use eventdesk_core::models::{Configuration, Resource, Session, User, now};
use eventdesk_core::services::Condition;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{Payload, configurations, resolve};
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

/// Path alias for the caller's own profile
const ME: &str = "me";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub section_country: Option<String>,
    pub registered: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserAction {
    #[serde(rename_all = "camelCase")]
    SubmitRegistration {
        registration_form: serde_json::Map<String, serde_json::Value>,
    },
    #[serde(rename_all = "camelCase")]
    AddFavoriteSession { session_id: String },
    #[serde(rename_all = "camelCase")]
    RemoveFavoriteSession { session_id: String },
    AddToGroup { group: Group },
    RemoveFromGroup { group: Group },
}

fn resolve_user_id(principal: &Principal, id: String) -> String {
    if id == ME {
        principal.user_id.clone()
    } else {
        id
    }
}

/// Section country of the caller when they lead a country delegation
pub async fn leader_country(
    ctx: &ApiContext,
    principal: &Principal,
) -> Result<Option<String>, ApiError> {
    if !principal.permissions.is_country_leader {
        return Ok(None);
    }
    let profile: Option<User> = ctx.repo.get(&User::key_for(&principal.user_id)).await?;
    Ok(profile.and_then(|user| user.section_country))
}

/// The section country must be one the platform knows
fn check_section_country(configuration: &Configuration, user: &User) -> Result<(), ApiError> {
    match &user.section_country {
        Some(country) if !configuration.has_section_country(country) => {
            Err(EventDeskError::invalid_fields(&["sectionCountry"]).into())
        }
        _ => Ok(()),
    }
}

fn require_self(principal: &Principal, user_id: &str) -> Result<(), ApiError> {
    if principal.is(user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Operation reserved to the profile owner".to_string(),
        ))
    }
}

/// Creates the caller's own profile
pub async fn create(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(user): Payload<User>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = User {
        user_id: principal.user_id.clone(),
        email: principal.email.clone(),
        registration_form: Default::default(),
        registration_at: None,
        spot: None,
        favorite_sessions: Vec::new(),
        created_at: now(),
        updated_at: None,
        ..user.cleaned()
    };
    user.validate()?;
    check_section_country(&configurations::current(&ctx.repo).await?, &user)?;

    ctx.repo.create(&user).await?;

    info!(user_id = %user.user_id, "Created user profile");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user_id = resolve_user_id(&principal, id);
    let user: User = ctx.repo.load(&User::key_for(&user_id)).await?;

    if principal.is(&user_id) || principal.permissions.can_manage_registrations {
        return Ok(Json(user));
    }

    let country = leader_country(&ctx, &principal).await?;
    if country.is_some() && user.section_country == country {
        return Ok(Json(user));
    }

    Err(ApiError::Forbidden(
        "Not allowed to read this profile".to_string(),
    ))
}

/// Registration managers see everyone; country leaders see their country
pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<User>>, ApiError> {
    let country = if principal.permissions.can_manage_registrations {
        filter.section_country
    } else {
        let country = leader_country(&ctx, &principal).await?.ok_or_else(|| {
            ApiError::Forbidden("Operation reserved to registration managers".to_string())
        })?;
        Some(country)
    };

    let mut users: Vec<User> = ctx
        .repo
        .list::<User>()
        .await?
        .into_iter()
        .filter(|user| country.is_none() || user.section_country == country)
        .filter(|user| {
            filter
                .registered
                .is_none_or(|registered| user.is_registered() == registered)
        })
        .collect();
    users.sort_by(|a, b| {
        (a.last_name.as_str(), a.first_name.as_str())
            .cmp(&(b.last_name.as_str(), b.first_name.as_str()))
    });

    Ok(Json(users))
}

pub async fn update(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(user): Payload<User>,
) -> Result<Json<User>, ApiError> {
    let user_id = resolve_user_id(&principal, id);
    if !principal.is(&user_id) {
        principal.require_admin()?;
    }

    let existing: User = ctx.repo.load(&User::key_for(&user_id)).await?;
    let mut user = user.safe_load(&existing);
    user.validate()?;
    if user.section_country != existing.section_country {
        check_section_country(&configurations::current(&ctx.repo).await?, &user)?;
    }

    user.updated_at = Some(now());
    save_profile(&ctx, &user).await?;

    Ok(Json(user))
}

/// Saves a profile read earlier, unless a spot was attached or detached meanwhile
async fn save_profile(ctx: &ApiContext, user: &User) -> Result<(), ApiError> {
    ctx.repo
        .save_if(user, Condition::unchanged("spot", user.spot.as_ref())?)
        .await?;
    Ok(())
}

pub async fn patch(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(action): Payload<UserAction>,
) -> Result<Json<User>, ApiError> {
    let user_id = resolve_user_id(&principal, id);
    let mut user: User = ctx.repo.load(&User::key_for(&user_id)).await?;

    match action {
        UserAction::SubmitRegistration { registration_form } => {
            require_self(&principal, &user_id)?;

            let configuration = configurations::current(&ctx.repo).await?;
            if !configuration.is_registration_open
                && !principal.permissions.can_manage_registrations
            {
                return Err(ApiError::Forbidden("Registrations are closed".to_string()));
            }

            let missing = configuration.missing_form_fields(&registration_form);
            if !missing.is_empty() {
                return Err(ApiError::BadRequest(format!(
                    "Missing registration fields: {}",
                    missing.join(", ")
                )));
            }

            user.registration_form = registration_form;
            if user.registration_at.is_none() {
                user.registration_at = Some(now());
            }
            info!(user_id = %user_id, "Submitted registration");
        }
        UserAction::AddFavoriteSession { session_id } => {
            require_self(&principal, &user_id)?;
            let _session: Session = resolve(&ctx.repo, &Session::key_for(&session_id)).await?;
            if !user.favorite_sessions.contains(&session_id) {
                user.favorite_sessions.push(session_id);
            }
        }
        UserAction::RemoveFavoriteSession { session_id } => {
            require_self(&principal, &user_id)?;
            user.favorite_sessions.retain(|id| *id != session_id);
        }
        UserAction::AddToGroup { group } => {
            principal.require_admin()?;
            ctx.identity.add_user_to_group(&user_id, group).await?;
            return Ok(Json(user));
        }
        UserAction::RemoveFromGroup { group } => {
            principal.require_admin()?;
            ctx.identity.remove_user_from_group(&user_id, group).await?;
            return Ok(Json(user));
        }
    }

    user.updated_at = Some(now());
    save_profile(&ctx, &user).await?;
    Ok(Json(user))
}

/// Deletes the account and the profile; refused while a spot is attached
pub async fn delete(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_admin()?;

    let user: User = ctx.repo.load(&User::key_for(&id)).await?;
    if user.spot.is_some() {
        return Err(ApiError::Conflict(
            "Unassign the user's spot before deleting them".to_string(),
        ));
    }

    ctx.identity.delete_user(&user.user_id).await?;
    ctx.repo.remove::<User>(&user.key()).await?;

    info!(user_id = %user.user_id, "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}
