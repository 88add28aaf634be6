//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ApiError;
use crate::filters;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Static error panel.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub user: Option<String>,
    pub status: u16,
    pub title: &'static str,
    pub message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Api(err) => match err {
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
                ApiError::Submission(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is our fault (or the upstream API's).
    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    /// Message safe to show the user.
    fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Something went wrong on our end. Please try again.".to_string(),
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => {
                "We couldn't find what you were looking for.".to_string()
            }
            Self::Api(ApiError::Unauthorized) | Self::Unauthorized(_) => {
                "Please sign in to continue.".to_string()
            }
            Self::Api(ApiError::Submission(err)) => err.to_string(),
            Self::Api(_) => {
                "Our recommendation service is having trouble right now. Please try again in a moment."
                    .to_string()
            }
            Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Too many requests. Please slow down.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let page = ErrorTemplate {
            user: None,
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error"),
            message: self.public_message(),
        };

        (status, page).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("quiz", "Submitted answers", Some(&[("quiz_id", "1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vaporwise_core::QuestionId;
    use vaporwise_core::quiz::SubmissionError;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("vaporizer".to_string());
        assert_eq!(err.to_string(), "Not found: vaporizer");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            get_status(ApiError::NotFound("vaporizer x".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(
                ApiError::Status {
                    status: 500,
                    message: "boom".to_string()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(ApiError::Validation("bad".to_string()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(
                ApiError::Submission(SubmissionError::MissingAnswer(QuestionId::new(3))).into()
            ),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_only_server_errors_are_reported() {
        assert!(AppError::Internal("test".to_string()).is_server_error());
        assert!(AppError::Api(ApiError::Validation("bad".to_string())).is_server_error());
        assert!(!AppError::NotFound("test".to_string()).is_server_error());
        assert!(!AppError::RateLimited.is_server_error());
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("db password is hunter2".to_string());
        assert!(!err.public_message().contains("hunter2"));

        let err = AppError::Api(ApiError::Status {
            status: 503,
            message: "upstream stack trace".to_string(),
        });
        assert!(!err.public_message().contains("stack trace"));
    }
}
