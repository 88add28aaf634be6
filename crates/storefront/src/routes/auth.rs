//! Authentication route handlers.
//!
//! Accounts live in the remote API. Logging in stores the returned user and
//! upstream session cookie in the storefront session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use vaporwise_core::Email;

use crate::api::{ApiError, AuthSession, Registration};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::safe_next;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub display_name: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error display and post-login redirect.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

/// Human-readable text for an error code from the query string.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "That email and password don't match an account.",
        "invalid_email" => "Enter a valid email address.",
        "password_mismatch" => "Passwords don't match.",
        "password_too_short" => "Passwords need at least 8 characters.",
        "email_taken" => "An account with that email already exists.",
        "expired" => "Your session expired. Please log in again.",
        "session" => "We couldn't start your session. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<String>,
    pub error: Option<&'static str>,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<String>,
    pub error: Option<&'static str>,
    pub next: String,
    pub min_password_len: usize,
}

/// Redirect back to a form with an error code, keeping `next`.
fn redirect_with_error(path: &str, code: &str, next: &str) -> Response {
    let url = format!("{path}?error={code}&next={}", urlencoding::encode(next));
    Redirect::to(&url).into_response()
}

/// Store the authenticated user and redirect to `next`.
async fn start_session(
    session: &Session,
    auth: AuthSession,
    next: &str,
    form_path: &str,
) -> Response {
    let user = CurrentUser {
        id: auth.user.id,
        email: auth.user.email,
        display_name: auth.user.display_name,
        api_session: auth.session,
    };

    if let Err(e) = set_current_user(session, &user).await {
        tracing::error!("Failed to set session: {}", e);
        return redirect_with_error(form_path, "session", next);
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");

    Redirect::to(next).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(auth: OptionalAuth, Query(query): Query<AuthQuery>) -> impl IntoResponse {
    LoginTemplate {
        user: auth.greeting(),
        error: query.error.as_deref().map(error_message),
        next: safe_next(query.next.as_deref()).to_string(),
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref()).to_string();

    let Ok(email) = Email::parse(&form.email) else {
        return redirect_with_error("/auth/login", "invalid_email", &next);
    };

    let password = SecretString::from(form.password);
    match state.api().login(&email, &password).await {
        Ok(auth) => start_session(&session, auth, &next, "/auth/login").await,
        Err(ApiError::Unauthorized | ApiError::NotFound(_)) => {
            tracing::info!("Login rejected");
            redirect_with_error("/auth/login", "credentials", &next)
        }
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            redirect_with_error("/auth/login", "failed", &next)
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    auth: OptionalAuth,
    Query(query): Query<AuthQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        user: auth.greeting(),
        error: query.error.as_deref().map(error_message),
        next: safe_next(query.next.as_deref()).to_string(),
        min_password_len: MIN_PASSWORD_LEN,
    }
}

/// Handle registration form submission.
///
/// A successful registration logs the user straight in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let next = safe_next(form.next.as_deref()).to_string();

    if form.password != form.password_confirm {
        return redirect_with_error("/auth/register", "password_mismatch", &next);
    }

    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return redirect_with_error("/auth/register", "password_too_short", &next);
    }

    let Ok(email) = Email::parse(&form.email) else {
        return redirect_with_error("/auth/register", "invalid_email", &next);
    };

    let registration = Registration {
        email,
        password: SecretString::from(form.password),
        display_name: form
            .display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    };

    match state.api().register(&registration).await {
        Ok(auth) => start_session(&session, auth, &next, "/auth/register").await,
        Err(ApiError::Status { status: 409, .. }) => {
            redirect_with_error("/auth/register", "email_taken", &next)
        }
        Err(e) => {
            tracing::warn!("Registration failed: {}", e);
            redirect_with_error("/auth/register", "failed", &next)
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// The upstream logout is best effort; the local session is cleared
/// regardless.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    if let Some(user) = user {
        if let Err(e) = state.api().logout(&user.api_session).await {
            tracing::warn!("Upstream logout failed: {}", e);
        }
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert!(error_message("credentials").contains("don't match"));
        assert!(error_message("password_too_short").contains('8'));
        assert!(error_message("unheard-of").contains("Something went wrong"));
    }

    #[test]
    fn test_redirect_with_error_keeps_next() {
        let response = redirect_with_error("/auth/login", "credentials", "/quiz/1");
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/auth/login?error=credentials&next=%2Fquiz%2F1")
        );
    }
}
