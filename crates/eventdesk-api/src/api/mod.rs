/// API endpoint modules
pub mod communications;
pub mod configurations;
pub mod contests;
pub mod health;
pub mod media;
pub mod organizations;
pub mod rooms;
pub mod sessions;
pub mod speakers;
pub mod spots;
pub mod useful_links;
pub mod users;
pub mod venues;

use crate::error::ApiError;
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use eventdesk_core::EventDeskError;
use eventdesk_core::models::Resource;
use eventdesk_core::services::{Key, Repository};
use serde::de::DeserializeOwned;

/// Loads a resource referenced by the request body; an unknown reference is a
/// client error rather than a missing route resource
pub async fn resolve<T: Resource>(repo: &Repository, key: &Key) -> Result<T, ApiError> {
    repo.load::<T>(key).await.map_err(|e| match e {
        EventDeskError::NotFound(msg) => ApiError::BadRequest(msg),
        other => other.into(),
    })
}

/// JSON request body whose rejections are reported as `400` API errors
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
