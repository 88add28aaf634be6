//! Authentication extractors.
//!
//! The remote API owns accounts. The session only remembers the logged-in
//! [`CurrentUser`] and their upstream cookie.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// Page requests are redirected to the login page with a `next` parameter
/// pointing back at the original path. HTMX and component requests get a
/// plain 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.greeting_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but nobody is logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page, then back to `next`.
    RedirectToLogin { next: String },
    /// Unauthorized response (for fragment requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => {
                let url = format!("/auth/login?next={}", urlencoding::encode(&next));
                Redirect::to(&url).into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                // Nested routers see a stripped uri
                let path = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map_or_else(|| parts.uri.path(), |original| original.path());
                let is_fragment =
                    parts.headers.contains_key("hx-request") || path.starts_with("/components/");
                if is_fragment {
                    AuthRejection::Unauthorized
                } else {
                    AuthRejection::RedirectToLogin {
                        next: path.to_string(),
                    }
                }
            })?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this never rejects the request.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl OptionalAuth {
    /// Name for the page header, if someone is logged in.
    #[must_use]
    pub fn greeting(&self) -> Option<String> {
        self.0.as_ref().map(|u| u.greeting_name().to_string())
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

/// Log out a user whose upstream API session expired and send them back
/// to log in, returning to `next` afterwards.
pub async fn expired_session_redirect(session: &Session, next: &str) -> Response {
    if let Err(e) = clear_current_user(session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    Redirect::to(&expired_login_url(next)).into_response()
}

fn expired_login_url(next: &str) -> String {
    format!(
        "/auth/login?error=expired&next={}",
        urlencoding::encode(next)
    )
}

/// Sanitize a post-login redirect target.
///
/// Only same-site absolute paths are allowed; anything else falls back to
/// the home page.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/quiz/1")), "/quiz/1");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_redirect_carries_next() {
        let response = AuthRejection::RedirectToLogin {
            next: "/quiz/1".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").map(|v| v.to_str().ok()),
            Some(Some("/auth/login?next=%2Fquiz%2F1"))
        );
    }

    #[test]
    fn test_expired_login_url() {
        assert_eq!(
            expired_login_url("/results/12"),
            "/auth/login?error=expired&next=%2Fresults%2F12"
        );
    }
}
