/// Useful link endpoints
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventdesk_core::models::{Resource, UsefulLink, new_id};
use eventdesk_core::services::Condition;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::Payload;
use crate::auth::UserClaims;
use crate::context::ApiContext;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkAction {
    #[serde(rename_all = "camelCase")]
    SwapSort { other_link_id: String },
}

/// All links, in display order
pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
) -> Result<Json<Vec<UsefulLink>>, ApiError> {
    let mut links = ctx.repo.list::<UsefulLink>().await?;
    links.sort_by_key(|link| link.sort);
    Ok(Json(links))
}

pub async fn get(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(_principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<Json<UsefulLink>, ApiError> {
    Ok(Json(ctx.repo.load(&UsefulLink::key_for(&id)).await?))
}

/// Creates a link at the end of the list
pub async fn create(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Payload(link): Payload<UsefulLink>,
) -> Result<(StatusCode, Json<UsefulLink>), ApiError> {
    principal.require_content_manager()?;

    let last = ctx
        .repo
        .list::<UsefulLink>()
        .await?
        .iter()
        .map(|link| link.sort)
        .max()
        .unwrap_or(0);

    let link = UsefulLink {
        link_id: new_id(),
        sort: last + 1,
        ..link.cleaned()
    };
    link.validate()?;
    ctx.repo.create(&link).await?;

    info!(link_id = %link.link_id, sort = link.sort, "Created useful link");
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn update(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(link): Payload<UsefulLink>,
) -> Result<Json<UsefulLink>, ApiError> {
    principal.require_content_manager()?;

    let existing: UsefulLink = ctx.repo.load(&UsefulLink::key_for(&id)).await?;
    let link = link.safe_load(&existing);
    link.validate()?;
    ctx.repo.save(&link).await?;

    Ok(Json(link))
}

pub async fn patch(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
    Payload(action): Payload<LinkAction>,
) -> Result<Json<Vec<UsefulLink>>, ApiError> {
    principal.require_content_manager()?;

    match action {
        LinkAction::SwapSort { other_link_id } => {
            if other_link_id == id {
                return Err(ApiError::BadRequest(
                    "Cannot swap a link with itself".to_string(),
                ));
            }

            let link: UsefulLink = ctx.repo.load(&UsefulLink::key_for(&id)).await?;
            let other: UsefulLink = ctx.repo.load(&UsefulLink::key_for(&other_link_id)).await?;

            let swapped = UsefulLink {
                sort: other.sort,
                ..link.clone()
            };
            let other_swapped = UsefulLink {
                sort: link.sort,
                ..other.clone()
            };

            // Both orders must be unchanged since they were read
            ctx.repo
                .transact(vec![
                    ctx.repo
                        .put_op(&swapped, Condition::equals("sort", link.sort))?,
                    ctx.repo
                        .put_op(&other_swapped, Condition::equals("sort", other.sort))?,
                ])
                .await?;

            info!(link_id = %id, other_link_id = %other_link_id, "Swapped useful links");
            Ok(Json(vec![swapped, other_swapped]))
        }
    }
}

pub async fn delete(
    State(ctx): State<Arc<ApiContext>>,
    Extension(UserClaims(principal)): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_content_manager()?;

    ctx.repo
        .remove::<UsefulLink>(&UsefulLink::key_for(&id))
        .await?;
    info!(link_id = %id, "Deleted useful link");
    Ok(StatusCode::NO_CONTENT)
}
