/// EventDesk API - REST API Lambda
///
/// This module contains the REST resource handlers of the EventDesk backend.
pub mod api;
pub mod auth;
pub mod context;
pub mod error;
pub mod middleware;

pub use context::ApiContext;
pub use error::ApiError;

use axum::{
    Router,
    body::Body as AxumBody,
    extract::DefaultBodyLimit,
    http::{Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use lambda_http::{Body, Error as LambdaError, Request, Response};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Builds the application router
pub fn router(ctx: Arc<ApiContext>) -> Router {
    // Build protected routes that require JWT authentication
    let protected = Router::new()
        // Platform configuration
        .route(
            "/configurations",
            get(api::configurations::get).put(api::configurations::put),
        )
        // Users
        .route("/users", get(api::users::list).post(api::users::create))
        .route(
            "/users/{id}",
            get(api::users::get)
                .put(api::users::update)
                .patch(api::users::patch)
                .delete(api::users::delete),
        )
        // Event spots
        .route("/spots", get(api::spots::list).post(api::spots::create))
        .route(
            "/spots/{id}",
            get(api::spots::get)
                .put(api::spots::update)
                .patch(api::spots::patch)
                .delete(api::spots::delete),
        )
        .route(
            "/spots/{id}/proof-of-payment",
            get(api::spots::proof_download_url).post(api::spots::proof_upload_url),
        )
        // Contests
        .route(
            "/contests",
            get(api::contests::list).post(api::contests::create),
        )
        .route(
            "/contests/{id}",
            get(api::contests::get)
                .put(api::contests::update)
                .patch(api::contests::patch)
                .delete(api::contests::delete),
        )
        // Communications
        .route(
            "/communications",
            get(api::communications::list).post(api::communications::create),
        )
        .route(
            "/communications/{id}",
            get(api::communications::get)
                .put(api::communications::update)
                .delete(api::communications::delete),
        )
        // Organizations, venues, rooms and speakers
        .route(
            "/organizations",
            get(api::organizations::list).post(api::organizations::create),
        )
        .route(
            "/organizations/{id}",
            get(api::organizations::get)
                .put(api::organizations::update)
                .delete(api::organizations::delete),
        )
        .route("/venues", get(api::venues::list).post(api::venues::create))
        .route(
            "/venues/{id}",
            get(api::venues::get)
                .put(api::venues::update)
                .delete(api::venues::delete),
        )
        .route("/rooms", get(api::rooms::list).post(api::rooms::create))
        .route(
            "/rooms/{id}",
            get(api::rooms::get)
                .put(api::rooms::update)
                .delete(api::rooms::delete),
        )
        .route(
            "/speakers",
            get(api::speakers::list).post(api::speakers::create),
        )
        .route(
            "/speakers/{id}",
            get(api::speakers::get)
                .put(api::speakers::update)
                .delete(api::speakers::delete),
        )
        // Sessions and registrations
        .route(
            "/sessions",
            get(api::sessions::list).post(api::sessions::create),
        )
        .route(
            "/sessions/{id}",
            get(api::sessions::get)
                .put(api::sessions::update)
                .patch(api::sessions::patch)
                .delete(api::sessions::delete),
        )
        .route(
            "/sessions/{id}/registrations",
            get(api::sessions::registrations),
        )
        .route("/registrations", get(api::sessions::my_registrations))
        // Useful links
        .route(
            "/useful-links",
            get(api::useful_links::list).post(api::useful_links::create),
        )
        .route(
            "/useful-links/{id}",
            get(api::useful_links::get)
                .put(api::useful_links::update)
                .patch(api::useful_links::patch)
                .delete(api::useful_links::delete),
        )
        // Media
        .route("/media/images", post(api::media::image_upload_url))
        // Apply JWT authentication middleware to all protected routes
        .route_layer(axum_middleware::from_fn_with_state(
            Arc::clone(&ctx),
            auth::auth_middleware,
        ));

    // Build API v1 router with public and protected routes
    let v1_router = Router::new()
        // Health endpoint (no auth required)
        .route("/health", get(api::health::handler))
        .merge(protected);

    Router::new()
        .nest("/v1", v1_router)
        .route_layer(axum_middleware::from_fn_with_state(
            Arc::clone(&ctx),
            middleware::logging_middleware,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
        // API Gateway payload limit
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(ctx)
}

/// Main API handler - converts Lambda HTTP request to Axum router
pub async fn handler(ctx: Arc<ApiContext>, event: Request) -> Result<Response<Body>, LambdaError> {
    info!(method = %event.method(), uri = %event.uri(), "Processing API request");

    let app = router(ctx);

    // Convert Lambda HTTP request to Axum request
    let (parts, body) = event.into_parts();
    let axum_request = http::Request::from_parts(parts, AxumBody::from(body.to_vec()));

    match app.oneshot(axum_request).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();

            // Convert Axum response body to Lambda response body
            let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    error!("Failed to read response body: {}", err);
                    return internal_error();
                }
            };

            Ok(Response::from_parts(parts, Body::from(body_bytes.to_vec())))
        }
        Err(err) => {
            error!("Axum router error: {}", err);
            internal_error()
        }
    }
}

fn internal_error() -> Result<Response<Body>, LambdaError> {
    let response = Response::builder()
        .status(500)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({
                "error": "Internal server error"
            })
            .to_string(),
        ))?;
    Ok(response)
}
