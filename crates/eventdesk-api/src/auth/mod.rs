/// Authentication: bearer token verification and the principal extension
pub mod jwt;

pub use jwt::JwksVerifier;

use crate::context::ApiContext;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use eventdesk_core::auth::Principal;
use std::sync::Arc;
use tracing::debug;

/// Turns a bearer token into the caller's principal
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Principal, String>;
}

/// The authenticated caller, stored in the request extensions
#[derive(Debug, Clone)]
pub struct UserClaims(pub Principal);

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_token(auth_header: Option<&str>) -> Result<&str, String> {
    let auth_header = auth_header.ok_or_else(|| "Missing Authorization header".to_string())?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| "Authorization header must start with 'Bearer '".to_string())
}

/// Rejects unauthenticated requests and attaches `UserClaims` to the others
pub async fn auth_middleware(
    State(ctx): State<Arc<ApiContext>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let principal = extract_token(auth_header)
        .and_then(|token| ctx.tokens.verify(token))
        .map_err(|e| {
            debug!(error = %e, "Rejected token");
            ApiError::Unauthorized("Invalid or missing token".to_string())
        })?;

    request.extensions_mut().insert(UserClaims(principal));
    Ok(next.run(request).await)
}
