//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness (remote API reachable)
//!
//! # Explore
//! GET  /explore                - Community templates (?q=&category=&sort=&page=&preview=)
//!
//! # Products
//! GET  /products/{slug}        - Vaporizer detail
//!
//! # Quiz
//! GET  /quiz                   - Quiz list
//! GET  /quiz/{id}              - Take a quiz
//! POST /quiz/{id}              - Submit answers (requires login)
//!
//! # Results
//! GET  /results                - Demo results gallery
//! GET  /results/demo/{id}      - Demo result detail
//! GET  /results/{id}           - Attempt result (requires login)
//!
//! # Legacy scorer
//! GET  /recommend              - Preferences form
//! POST /recommend              - Ranked catalog matches
//!
//! # Auth (rate limited)
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Components (HTMX fragments)
//! POST /components/checkbox-group
//! POST /components/rank-order
//! POST /components/range-slider
//! ```

pub mod auth;
pub mod components;
pub mod explore;
pub mod form;
pub mod home;
pub mod products;
pub mod quiz;
pub mod recommend;
pub mod results;

use axum::{
    Router,
    http::Uri,
    routing::{get, post},
};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the quiz routes router.
pub fn quiz_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(quiz::index))
        .route("/{id}", get(quiz::show).post(quiz::submit))
}

/// Create the results routes router.
pub fn results_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(results::index))
        .route("/demo/{id}", get(results::demo))
        .route("/{id}", get(results::attempt))
}

/// Create the HTMX component routes router.
pub fn component_routes() -> Router<AppState> {
    Router::new()
        .route("/checkbox-group", post(components::checkbox_group))
        .route("/rank-order", post(components::rank_order))
        .route("/range-slider", post(components::range_slider))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/explore", get(explore::index))
        .route("/products/{slug}", get(products::show))
        .route(
            "/recommend",
            get(recommend::form_page).post(recommend::submit),
        )
        .nest("/quiz", quiz_routes())
        .nest("/results", results_routes())
        .nest("/components", component_routes())
        .nest("/auth", auth_routes())
}

/// Fallback for unmatched paths.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
