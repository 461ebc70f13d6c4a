/// Event spot endpoints: distribution, assignment and payment of the spots
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eventdesk_core::EventDeskError;
use eventdesk_core::auth::Principal;
use eventdesk_core::constants::MAX_SPOTS_PER_REQUEST;
use eventdesk_core::models::{
    Configuration, EventSpot, EventSpotAttached, Resource, User, new_id, now, to_item,
};
use eventdesk_core::services::email::{payment_confirmed, spot_assigned};
use eventdesk_core::services::media::{is_proof_key_of, proof_key};
use eventdesk_core::services::{Condition, WriteOp};
use eventdesk_core::utils::clean_optional;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::users::leader_country;
use super::{Payload, configurations, resolve};
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpots {
    #[serde(rename = "type")]
    pub spot_type: String,
    pub description: Option<String>,
    pub section_country: Option<String>,
    pub number_of_spots: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotFilter {
    pub section_country: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotAction {
    #[serde(rename_all = "camelCase")]
    AssignToCountry { section_country: Option<String> },
    #[serde(rename_all = "camelCase")]
    AssignToUser { user_id: Option<String> },
    SetProofOfPayment { key: String },
    ConfirmPayment { confirmed: bool },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofUploadRequest {
    pub content_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofUpload {
    pub key: String,
    pub upload_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProofDownload {
    pub url: String,
}

fn check_configured(configuration: &Configuration, spot: &EventSpot) -> Result<(), ApiError> {
    let mut invalid = Vec::new();
    if !configuration.has_spot_type(&spot.spot_type) {
        invalid.push("type");
    }
    if let Some(country) = &spot.section_country {
        if !configuration.has_section_country(country) {
            invalid.push("sectionCountry");
        }
    }
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(EventDeskError::invalid_fields(&invalid).into())
    }
}

/// Write of the spot attached to a user's profile, provided the profile still
/// holds the attachment we read; the rest of the profile is left alone
fn holder_op(
    ctx: &ApiContext,
    user_id: &str,
    read: Option<&EventSpotAttached>,
    attached: Option<EventSpotAttached>,
) -> Result<WriteOp, ApiError> {
    Ok(ctx.repo.update_op::<User>(
        User::key_for(user_id),
        to_item(&json!({ "spot": attached }))?,
        Condition::unchanged("spot", read)?,
    ))
}

/// Write of the spot, conditional on its holder being the one we read
fn spot_op(ctx: &ApiContext, spot: &EventSpot, holder: Option<&str>) -> Result<WriteOp, ApiError> {
    let condition = match holder {
        Some(user_id) => Condition::equals("userId", user_id),
        None => Condition::absent("userId").and_exists(),
    };
    Ok(ctx.repo.put_op(spot, condition)?)
}

fn map_conflict(e: EventDeskError) -> ApiError {
    match e {
        EventDeskError::Conflict(_) => {
            ApiError::Conflict("The spot or its holder changed meanwhile".to_string())
        }
        other => other.into(),
    }
}

/// Creates a batch of identical spots
pub async fn create(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(request): Payload<NewSpots>,
) -> Result<(StatusCode, Json<Vec<EventSpot>>), ApiError> {
    principal.require_registration_manager()?;

    if request.number_of_spots == 0 || request.number_of_spots > MAX_SPOTS_PER_REQUEST {
        return Err(ApiError::BadRequest(format!(
            "Number of spots must be between 1 and {}",
            MAX_SPOTS_PER_REQUEST
        )));
    }

    let template = EventSpot {
        spot_type: request.spot_type,
        description: request.description,
        section_country: clean_optional(request.section_country),
        ..EventSpot::default()
    }
    .cleaned();
    template.validate()?;
    check_configured(&configurations::current(&ctx.repo).await?, &template)?;

    let mut spots = Vec::with_capacity(request.number_of_spots as usize);
    for _ in 0..request.number_of_spots {
        let spot = EventSpot {
            spot_id: new_id(),
            created_at: now(),
            ..template.clone()
        };
        ctx.repo.create(&spot).await?;
        spots.push(spot);
    }

    info!(
        count = spots.len(),
        spot_type = %template.spot_type,
        "Created spots"
    );
    Ok((StatusCode::CREATED, Json(spots)))
}

/// Registration managers see every spot; country leaders see their country's
pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Query(filter): Query<SpotFilter>,
) -> Result<Json<Vec<EventSpot>>, ApiError> {
    let country = if principal.permissions.can_manage_registrations {
        filter.section_country
    } else {
        let country = leader_country(&ctx, &principal).await?.ok_or_else(|| {
            ApiError::Forbidden("Operation reserved to registration managers".to_string())
        })?;
        Some(country)
    };

    let mut spots: Vec<EventSpot> = ctx
        .repo
        .list::<EventSpot>()
        .await?
        .into_iter()
        .filter(|spot| country.is_none() || spot.section_country == country)
        .collect();
    spots.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    Ok(Json(spots))
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<EventSpot>, ApiError> {
    let spot: EventSpot = ctx.repo.load(&EventSpot::key_for(&id)).await?;

    if principal.permissions.can_manage_registrations || spot.is_held_by(&principal.user_id) {
        return Ok(Json(spot));
    }

    let country = leader_country(&ctx, &principal).await?;
    if spot.belongs_to_country(country.as_deref()) {
        return Ok(Json(spot));
    }

    Err(ApiError::Forbidden("Not allowed to read this spot".to_string()))
}

/// Changes the type or the description of a spot
pub async fn update(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(spot): Payload<EventSpot>,
) -> Result<Json<EventSpot>, ApiError> {
    principal.require_registration_manager()?;

    let existing: EventSpot = ctx.repo.load(&EventSpot::key_for(&id)).await?;
    let spot = spot.safe_load(&existing);
    spot.validate()?;
    check_configured(&configurations::current(&ctx.repo).await?, &spot)?;

    let mut ops = vec![spot_op(&ctx, &spot, existing.user_id.as_deref())?];
    if let Some(holder_id) = &existing.user_id {
        let holder: User = ctx.repo.load(&User::key_for(holder_id)).await?;
        ops.push(holder_op(
            &ctx,
            holder_id,
            holder.spot.as_ref(),
            Some(spot.attached()),
        )?);
    }
    ctx.repo.transact(ops).await.map_err(map_conflict)?;

    Ok(Json(spot))
}

pub async fn delete(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_registration_manager()?;

    let spot: EventSpot = ctx.repo.load(&EventSpot::key_for(&id)).await?;
    if spot.is_assigned() {
        return Err(ApiError::Conflict(
            "Unassign the spot before deleting it".to_string(),
        ));
    }

    ctx.repo.remove::<EventSpot>(&spot.key()).await?;
    info!(spot_id = %id, "Deleted spot");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn patch(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(action): Payload<SpotAction>,
) -> Result<Json<EventSpot>, ApiError> {
    let spot: EventSpot = ctx.repo.load(&EventSpot::key_for(&id)).await?;

    let spot = match action {
        SpotAction::AssignToCountry { section_country } => {
            assign_to_country(&ctx, &principal, spot, clean_optional(section_country)).await?
        }
        SpotAction::AssignToUser { user_id } => {
            assign_to_user(&ctx, &principal, spot, clean_optional(user_id)).await?
        }
        SpotAction::SetProofOfPayment { key } => {
            set_proof_of_payment(&ctx, &principal, spot, key).await?
        }
        SpotAction::ConfirmPayment { confirmed } => {
            confirm_payment(&ctx, &principal, spot, confirmed).await?
        }
    };

    Ok(Json(spot))
}

async fn assign_to_country(
    ctx: &ApiContext,
    principal: &Principal,
    spot: EventSpot,
    section_country: Option<String>,
) -> Result<EventSpot, ApiError> {
    principal.require_registration_manager()?;

    if spot.is_assigned() {
        return Err(ApiError::Conflict(
            "The spot is held by a user; unassign it first".to_string(),
        ));
    }

    let spot = EventSpot {
        section_country,
        ..spot
    };
    check_configured(&configurations::current(&ctx.repo).await?, &spot)?;

    ctx.repo
        .transact(vec![spot_op(ctx, &spot, None)?])
        .await
        .map_err(map_conflict)?;

    info!(
        spot_id = %spot.spot_id,
        section_country = ?spot.section_country,
        "Assigned spot to country"
    );
    Ok(spot)
}

/// Gives the spot to a user, or takes it back when `user_id` is `None`
///
/// The spot, the new holder's profile and the previous holder's profile are
/// written in a single transaction.
async fn assign_to_user(
    ctx: &ApiContext,
    principal: &Principal,
    spot: EventSpot,
    user_id: Option<String>,
) -> Result<EventSpot, ApiError> {
    let target: Option<User> = match &user_id {
        Some(user_id) => Some(resolve(&ctx.repo, &User::key_for(user_id)).await?),
        None => None,
    };

    if !principal.permissions.can_manage_registrations {
        let configuration = configurations::current(&ctx.repo).await?;
        let country = leader_country(ctx, principal).await?;
        let allowed = configuration.can_country_leaders_assign_spots
            && spot.belongs_to_country(country.as_deref())
            && target
                .as_ref()
                .is_none_or(|user| user.section_country == country);
        if !allowed {
            return Err(ApiError::Forbidden(
                "Not allowed to assign this spot".to_string(),
            ));
        }
    }

    if spot.is_paid() {
        return Err(ApiError::Conflict(
            "The spot is already paid and can't change hands".to_string(),
        ));
    }

    if let Some(user) = &target {
        if spot.is_held_by(&user.user_id) {
            return Ok(spot);
        }
        if !user.is_registered() {
            return Err(ApiError::BadRequest(
                "The user hasn't submitted a registration".to_string(),
            ));
        }
        if user.spot.is_some() {
            return Err(ApiError::Conflict("The user already holds a spot".to_string()));
        }
    }

    let previous_holder = spot.user_id.clone();
    let previous_proof = spot.proof_of_payment_uri.clone();
    let updated = EventSpot {
        user_id: target.as_ref().map(|user| user.user_id.clone()),
        user_name: target.as_ref().map(User::full_name),
        proof_of_payment_uri: None,
        ..spot
    };

    let mut ops = vec![spot_op(ctx, &updated, previous_holder.as_deref())?];
    if let Some(previous_id) = &previous_holder {
        let previous: User = ctx.repo.load(&User::key_for(previous_id)).await?;
        ops.push(holder_op(ctx, previous_id, previous.spot.as_ref(), None)?);
    }
    if let Some(user) = &target {
        ops.push(holder_op(ctx, &user.user_id, None, Some(updated.attached()))?);
    }
    ctx.repo.transact(ops).await.map_err(map_conflict)?;

    if let Some(key) = &previous_proof {
        ctx.discard_media(key).await;
    }

    info!(
        spot_id = %updated.spot_id,
        user_id = ?updated.user_id,
        previous_user_id = ?previous_holder,
        "Assigned spot to user"
    );

    if let Some(user) = &target {
        ctx.notify(spot_assigned(user, &updated, ctx.app_url.as_deref()))
            .await;
    }

    Ok(updated)
}

async fn set_proof_of_payment(
    ctx: &ApiContext,
    principal: &Principal,
    spot: EventSpot,
    key: String,
) -> Result<EventSpot, ApiError> {
    if !spot.is_held_by(&principal.user_id) {
        return Err(ApiError::Forbidden(
            "Only the spot holder can provide a proof of payment".to_string(),
        ));
    }
    if spot.is_paid() {
        return Err(ApiError::Conflict(
            "The payment is already confirmed".to_string(),
        ));
    }
    if !is_proof_key_of(&spot.spot_id, &key) {
        return Err(EventDeskError::invalid_fields(&["key"]).into());
    }

    let replaced = spot
        .proof_of_payment_uri
        .clone()
        .filter(|previous| *previous != key);
    let updated = EventSpot {
        proof_of_payment_uri: Some(key),
        ..spot
    };
    let holder: User = ctx.repo.load(&User::key_for(&principal.user_id)).await?;

    ctx.repo
        .transact(vec![
            spot_op(ctx, &updated, Some(&principal.user_id))?,
            holder_op(
                ctx,
                &principal.user_id,
                holder.spot.as_ref(),
                Some(updated.attached()),
            )?,
        ])
        .await
        .map_err(map_conflict)?;

    info!(spot_id = %updated.spot_id, "Set proof of payment");
    if let Some(previous) = &replaced {
        ctx.discard_media(previous).await;
    }
    Ok(updated)
}

async fn confirm_payment(
    ctx: &ApiContext,
    principal: &Principal,
    spot: EventSpot,
    confirmed: bool,
) -> Result<EventSpot, ApiError> {
    principal.require_registration_manager()?;

    let holder_id = spot.user_id.clone().ok_or_else(|| {
        ApiError::BadRequest("The spot isn't assigned to a user".to_string())
    })?;
    let was_paid = spot.is_paid();

    let updated = EventSpot {
        payment_confirmed_at: if confirmed {
            spot.payment_confirmed_at.clone().or_else(|| Some(now()))
        } else {
            None
        },
        ..spot
    };
    let holder: User = ctx.repo.load(&User::key_for(&holder_id)).await?;

    ctx.repo
        .transact(vec![
            spot_op(ctx, &updated, Some(&holder_id))?,
            holder_op(
                ctx,
                &holder_id,
                holder.spot.as_ref(),
                Some(updated.attached()),
            )?,
        ])
        .await
        .map_err(map_conflict)?;

    info!(spot_id = %updated.spot_id, confirmed, "Changed payment confirmation");

    if confirmed && !was_paid {
        ctx.notify(payment_confirmed(&holder, &updated, ctx.app_url.as_deref()))
            .await;
    }

    Ok(updated)
}

/// Signed URL for the spot holder to upload a proof of payment
pub async fn proof_upload_url(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(request): Payload<ProofUploadRequest>,
) -> Result<Json<ProofUpload>, ApiError> {
    let spot: EventSpot = ctx.repo.load(&EventSpot::key_for(&id)).await?;
    if !spot.is_held_by(&principal.user_id) {
        return Err(ApiError::Forbidden(
            "Only the spot holder can provide a proof of payment".to_string(),
        ));
    }

    let key = proof_key(&spot.spot_id, &request.content_type)?;
    let upload_url = ctx.media.upload_url(&key, &request.content_type).await?;

    Ok(Json(ProofUpload { key, upload_url }))
}

/// Signed URL to read the proof of payment of a spot
pub async fn proof_download_url(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<ProofDownload>, ApiError> {
    let spot: EventSpot = ctx.repo.load(&EventSpot::key_for(&id)).await?;
    if !spot.is_held_by(&principal.user_id) {
        principal.require_registration_manager()?;
    }

    let key = spot
        .proof_of_payment_uri
        .as_deref()
        .ok_or_else(|| ApiError::NotFound("No proof of payment for this spot".to_string()))?;

    Ok(Json(ProofDownload {
        url: ctx.media.download_url(key).await?,
    }))
}
