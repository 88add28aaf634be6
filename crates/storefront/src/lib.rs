//! Vaporwise Storefront library.
//!
//! Server-rendered vaporizer recommendations: guided quiz, community explore
//! feed, product pages and a legacy offline scorer. All product, quiz and
//! account data lives behind the remote Vaporwise API.
//!
//! The router is built here so integration tests can drive it without a
//! socket; `main.rs` only adds process-level concerns (Sentry, tracing,
//! signals).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod fixtures;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use std::path::Path;

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::{Router, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full storefront router.
///
/// Includes health checks, every page route, static assets and the
/// middleware stack. Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let static_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("static");

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(routes::not_found)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the remote API is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.api().is_reachable().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
