/// Contest endpoints
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventdesk_core::EventDeskError;
use eventdesk_core::auth::Principal;
use eventdesk_core::models::{
    Contest, ContestVote, Resource, User, VoteStatus, new_id, now, to_item,
};
use eventdesk_core::services::{Condition, Counter, Item};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::Payload;
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContestAction {
    OpenVote,
    CloseVote,
    PublishResults,
    Vote { candidate: usize },
}

/// What the caller may see of a contest
fn visible(principal: &Principal, contest: Contest) -> Option<Contest> {
    if principal.permissions.can_manage_contents {
        Some(contest)
    } else if contest.enabled {
        Some(contest.public_view())
    } else {
        None
    }
}

pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
) -> Result<Json<Vec<Contest>>, ApiError> {
    let mut contests: Vec<Contest> = ctx
        .repo
        .list::<Contest>()
        .await?
        .into_iter()
        .filter_map(|contest| visible(&principal, contest))
        .collect();
    contests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(contests))
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<Contest>, ApiError> {
    let contest: Contest = ctx.repo.load(&Contest::key_for(&id)).await?;
    visible(&principal, contest)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Contest {} not found", id)))
}

pub async fn create(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(contest): Payload<Contest>,
) -> Result<(StatusCode, Json<Contest>), ApiError> {
    principal.require_content_manager()?;

    let contest = Contest {
        contest_id: new_id(),
        created_at: now(),
        vote_status: VoteStatus::Draft,
        vote_ends_at: None,
        results: Vec::new(),
        ..contest.cleaned()
    };
    contest.validate()?;
    ctx.repo.create(&contest).await?;

    info!(contest_id = %contest.contest_id, "Created contest");
    Ok((StatusCode::CREATED, Json(contest)))
}

pub async fn update(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(contest): Payload<Contest>,
) -> Result<Json<Contest>, ApiError> {
    principal.require_content_manager()?;

    let existing: Contest = ctx.repo.load(&Contest::key_for(&id)).await?;
    let contest = contest.safe_load(&existing);
    if existing.vote_status != VoteStatus::Draft && contest.candidates != existing.candidates {
        return Err(ApiError::Conflict(
            "Candidates can't change once the vote opened".to_string(),
        ));
    }
    contest.validate()?;

    // Votes keep counting meanwhile, so `results` is never written back
    ctx.repo
        .transact(vec![ctx.repo.update_op::<Contest>(
            contest.key(),
            contest.editable_fields()?,
            Condition::equals("voteStatus", existing.vote_status.as_str()),
        )])
        .await
        .map_err(status_changed)?;

    info!(contest_id = %contest.contest_id, "Updated contest");
    Ok(Json(ctx.repo.load(&contest.key()).await?))
}

pub async fn delete(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_content_manager()?;

    ctx.repo.remove::<Contest>(&Contest::key_for(&id)).await?;
    info!(contest_id = %id, "Deleted contest");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn patch(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(action): Payload<ContestAction>,
) -> Result<Json<Contest>, ApiError> {
    let contest: Contest = ctx.repo.load(&Contest::key_for(&id)).await?;

    let contest = match action {
        ContestAction::OpenVote => {
            principal.require_content_manager()?;
            if contest.candidates.is_empty() {
                return Err(ApiError::BadRequest(
                    "A contest needs candidates to open the vote".to_string(),
                ));
            }
            let fields = to_item(&json!({"results": vec![0; contest.candidates.len()]}))?;
            transition(&ctx, &contest, VoteStatus::Draft, VoteStatus::Open, fields).await?
        }
        ContestAction::CloseVote => {
            principal.require_content_manager()?;
            let fields = to_item(&json!({"voteEndsAt": now()}))?;
            transition(&ctx, &contest, VoteStatus::Open, VoteStatus::Closed, fields).await?
        }
        ContestAction::PublishResults => {
            principal.require_content_manager()?;
            transition(
                &ctx,
                &contest,
                VoteStatus::Closed,
                VoteStatus::Published,
                Item::new(),
            )
            .await?
        }
        ContestAction::Vote { candidate } => {
            vote(&ctx, &principal, &contest, candidate).await?;
            ctx.repo.load(&Contest::key_for(&id)).await?
        }
    };

    visible(&principal, contest)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Contest {} not found", id)))
}

fn status_changed(e: EventDeskError) -> ApiError {
    match e {
        EventDeskError::Conflict(_) => {
            ApiError::Conflict("Vote status changed meanwhile".to_string())
        }
        other => other.into(),
    }
}

/// Moves the vote to its next status, provided nobody moved it meanwhile
///
/// Only the status and `fields` are written: a vote counted between the read
/// and the write is kept.
async fn transition(
    ctx: &ApiContext,
    contest: &Contest,
    from: VoteStatus,
    to: VoteStatus,
    mut fields: Item,
) -> Result<Contest, ApiError> {
    if contest.vote_status != from {
        return Err(ApiError::Conflict(format!(
            "Vote is {}, expected {}",
            contest.vote_status.as_str(),
            from.as_str()
        )));
    }

    fields.insert("voteStatus".to_string(), json!(to.as_str()));
    ctx.repo
        .transact(vec![ctx.repo.update_op::<Contest>(
            contest.key(),
            fields,
            Condition::equals("voteStatus", from.as_str()),
        )])
        .await
        .map_err(status_changed)?;

    info!(
        contest_id = %contest.contest_id,
        status = to.as_str(),
        "Changed vote status"
    );
    Ok(ctx.repo.load(&contest.key()).await?)
}

/// Records the vote of the caller's country and counts it, atomically
async fn vote(
    ctx: &ApiContext,
    principal: &Principal,
    contest: &Contest,
    candidate: usize,
) -> Result<(), ApiError> {
    if !principal.permissions.is_country_leader {
        return Err(ApiError::Forbidden(
            "Only country leaders can vote".to_string(),
        ));
    }

    let user: User = ctx.repo.load(&User::key_for(&principal.user_id)).await?;
    let country = user.section_country.ok_or_else(|| {
        ApiError::Forbidden("Voting requires a section country".to_string())
    })?;

    if !contest.enabled || contest.vote_status != VoteStatus::Open {
        return Err(ApiError::Conflict("Vote is not open".to_string()));
    }

    let chosen = contest
        .candidates
        .get(candidate)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown candidate: {}", candidate)))?;
    if chosen.country.as_deref() == Some(country.as_str()) {
        return Err(ApiError::BadRequest(
            "A country can't vote for its own candidate".to_string(),
        ));
    }

    let ballot = ContestVote {
        contest_id: contest.contest_id.clone(),
        voter: country.clone(),
        user_id: principal.user_id.clone(),
        voted_at: now(),
    };

    ctx.repo
        .transact(vec![
            ctx.repo.put_op(&ballot, Condition::NotExists)?,
            ctx.repo.increment_op::<Contest>(
                contest.key(),
                Counter::element("results", candidate),
                1,
                Condition::equals("voteStatus", VoteStatus::Open.as_str()),
            ),
        ])
        .await
        .map_err(|e| match e {
            EventDeskError::Conflict(_) => ApiError::Conflict(
                "Your country already voted, or the vote closed meanwhile".to_string(),
            ),
            other => other.into(),
        })?;

    info!(
        contest_id = %contest.contest_id,
        voter = %country,
        user_id = %principal.user_id,
        "Recorded vote"
    );
    Ok(())
}
