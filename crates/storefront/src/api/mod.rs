//! Client for the remote Vaporwise recommendation API.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`; the API is the source of truth
//! - Every response is decoded into `vaporwise_core` types and validated
//! - Reads are cached in-memory via `moka` (5 minute TTL by default)
//! - Failed reads are retried with exponential backoff; mutations are not
//! - Per-user calls forward the upstream session cookie ([`ApiSession`])
//!
//! # Example
//!
//! ```rust,ignore
//! use vaporwise_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//!
//! let vaporizer = client.get_vaporizer_by_slug("mighty-plus").await?;
//! let quiz = client.get_quiz(QuizId::new(1)).await?;
//! let result = client.submit_quiz_answers(&submission, &user.api_session).await?;
//! ```
//!
//! [`ApiSession`]: crate::models::ApiSession

mod cache;
mod client;

pub use cache::{CacheKey, CacheValue};
pub use client::{ApiClient, MAX_BACKOFF, backoff_delay};

use serde::Deserialize;
use thiserror::Error;
use vaporwise_core::quiz::SubmissionError;
use vaporwise_core::{Email, UserId};

use crate::models::ApiSession;

/// Errors that can occur when talking to the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 404.
    #[error("{0} not found")]
    NotFound(String),

    /// The API rejected the credentials or session.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-success status.
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The body decoded but does not satisfy the expected schema.
    #[error("invalid API response: {0}")]
    Validation(String),

    /// The body is not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Answers were rejected before being sent.
    #[error("invalid submission: {0}")]
    Submission(#[from] SubmissionError),
}

impl ApiError {
    /// Whether repeating the same request could succeed.
    ///
    /// Not-found, authorization, schema and submission errors are
    /// deterministic. Client errors other than 408 and 429 are too.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::NotFound(_) | Self::Unauthorized | Self::Validation(_) | Self::Submission(_) => {
                false
            }
        }
    }
}

/// Account details returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: ApiUser,
    /// Cookie to forward on later per-user calls.
    pub session: ApiSession,
}

/// Registration details sent to the API.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: Email,
    pub password: secrecy::SecretString,
    pub display_name: Option<String>,
}

/// Truncate a response body for logging.
fn truncate(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ApiError::NotFound("vaporizer mighty-plus".to_string());
        assert_eq!(err.to_string(), "vaporizer mighty-plus not found");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_status_retryability() {
        let status = |status| ApiError::Status {
            status,
            message: String::new(),
        };
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(status(408).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(422).is_retryable());
    }

    #[test]
    fn test_deterministic_errors_are_terminal() {
        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(!ApiError::Validation("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 10), "ab");
    }
}
