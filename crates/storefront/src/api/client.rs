//! Remote API client implementation.
//!
//! Uses `reqwest` 0.13 for HTTP and caches reads with `moka`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use vaporwise_core::quiz::{AttemptResult, Quiz, QuizSubmission};
use vaporwise_core::vaporizer::Vaporizer;
use vaporwise_core::{AttemptId, Email, QuizId};

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, ApiUser, AuthSession, Registration, truncate};
use crate::config::ApiConfig;
use crate::models::ApiSession;

/// Upper bound for a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

const CACHE_CAPACITY: u64 = 1000;

/// Delay before retry number `attempt + 1`: `base * 2^attempt`, capped at
/// [`MAX_BACKOFF`].
#[must_use]
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_BACKOFF)
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the remote recommendation API.
///
/// Cheap to clone. Quizzes, vaporizers and completed attempts are cached.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
    max_retries: u32,
    retry_base_delay: Duration,
}

/// A successful response before decoding.
struct RawResponse {
    body: String,
    session: Option<ApiSession>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: ApiUser,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                cache,
                max_retries: config.max_retries,
                retry_base_delay: config.retry_base_delay,
            }),
        })
    }

    fn request(&self, method: Method, path: &str, session: Option<&ApiSession>) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self
            .inner
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        match session {
            Some(session) => builder.header(COOKIE, session.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and map the status to an error.
    async fn execute(&self, request: RequestBuilder, resource: &str) -> Result<RawResponse, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let session = session_from_headers(response.headers());

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        match status {
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound(resource.to_string())),
            StatusCode::UNAUTHORIZED => return Err(ApiError::Unauthorized),
            s if !s.is_success() => {
                tracing::error!(
                    status = %status,
                    body = %truncate(&body, 500),
                    "Remote API returned non-success status"
                );
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
            }
            _ => {}
        }

        Ok(RawResponse { body, session })
    }

    /// Run `call` until it succeeds, fails terminally, or retries run out.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.inner.max_retries => {
                    let delay = backoff_delay(self.inner.retry_base_delay, attempt);
                    attempt += 1;
                    warn!(
                        operation,
                        attempt,
                        delay = ?delay,
                        error = %e,
                        "Retrying API request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// GET `path` with retries and decode the body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        resource: &str,
        session: Option<&ApiSession>,
    ) -> Result<T, ApiError> {
        self.with_retry(path, move || async move {
            let raw = self
                .execute(self.request(Method::GET, path, session), resource)
                .await?;
            decode(&raw.body)
        })
        .await
    }

    // =========================================================================
    // Quiz Methods
    // =========================================================================

    /// List all quizzes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or any quiz is malformed.
    #[instrument(skip(self))]
    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>, ApiError> {
        if let Some(CacheValue::Quizzes(quizzes)) = self.inner.cache.get(&CacheKey::Quizzes).await {
            debug!("Cache hit for quizzes");
            return Ok(quizzes);
        }

        let mut quizzes: Vec<Quiz> = self.get_json("/quizzes", "quizzes", None).await?;
        for quiz in &mut quizzes {
            prepare_quiz(quiz)?;
        }

        self.inner
            .cache
            .insert(CacheKey::Quizzes, CacheValue::Quizzes(quizzes.clone()))
            .await;

        Ok(quizzes)
    }

    /// Get a quiz by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown quiz, or an error if the request
    /// fails or the quiz is malformed.
    #[instrument(skip(self), fields(quiz_id = %id))]
    pub async fn get_quiz(&self, id: QuizId) -> Result<Quiz, ApiError> {
        let cache_key = CacheKey::Quiz(id);

        if let Some(CacheValue::Quiz(quiz)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for quiz");
            return Ok(*quiz);
        }

        let path = format!("/quizzes/{id}");
        let mut quiz: Quiz = self.get_json(&path, &format!("quiz {id}"), None).await?;
        prepare_quiz(&mut quiz)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Quiz(Box::new(quiz.clone())))
            .await;

        Ok(quiz)
    }

    /// Submit quiz answers.
    ///
    /// The submission is validated against the quiz before it is sent. Not
    /// retried. On success the quiz, the quiz list and the attempt are
    /// evicted from the cache.
    ///
    /// # Errors
    ///
    /// Returns `Submission` for invalid answers, or an error if the request
    /// fails.
    #[instrument(skip(self, submission, session), fields(quiz_id = %submission.quiz_id))]
    pub async fn submit_quiz_answers(
        &self,
        submission: &QuizSubmission,
        session: &ApiSession,
    ) -> Result<AttemptResult, ApiError> {
        let quiz = self.get_quiz(submission.quiz_id).await?;
        quiz.validate_submission(submission)?;

        let path = format!("/quizzes/{}/attempts", submission.quiz_id);
        let request = self
            .request(Method::POST, &path, Some(session))
            .json(submission);
        let raw = self
            .execute(request, &format!("quiz {}", submission.quiz_id))
            .await?;

        let result: AttemptResult = decode(&raw.body)?;
        result.validate().map_err(ApiError::Validation)?;

        self.invalidate(&CacheKey::Quiz(submission.quiz_id)).await;
        self.invalidate(&CacheKey::Quizzes).await;
        self.invalidate(&CacheKey::Attempt(result.attempt_id())).await;

        Ok(result)
    }

    /// Get the result of an attempt.
    ///
    /// Only completed results are cached; a processing result is fetched
    /// again on the next call.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown attempt, or an error if the request
    /// fails or the result is malformed.
    #[instrument(skip(self, session), fields(attempt_id = %id))]
    pub async fn get_quiz_attempt(
        &self,
        id: AttemptId,
        session: &ApiSession,
    ) -> Result<AttemptResult, ApiError> {
        let cache_key = CacheKey::Attempt(id);

        if let Some(CacheValue::Attempt(result)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for attempt");
            return Ok(*result);
        }

        let path = format!("/attempts/{id}");
        let result: AttemptResult = self
            .get_json(&path, &format!("attempt {id}"), Some(session))
            .await?;
        result.validate().map_err(ApiError::Validation)?;

        if matches!(result, AttemptResult::Completed { .. }) {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Attempt(Box::new(result.clone())))
                .await;
        }

        Ok(result)
    }

    // =========================================================================
    // Vaporizer Methods
    // =========================================================================

    /// Get a vaporizer by its slug.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` (without retrying) for an unknown slug, or an
    /// error if the request fails or the record is malformed.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_vaporizer_by_slug(&self, slug: &str) -> Result<Vaporizer, ApiError> {
        let cache_key = CacheKey::Vaporizer(slug.to_string());

        if let Some(CacheValue::Vaporizer(vaporizer)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for vaporizer");
            return Ok(*vaporizer);
        }

        let path = format!("/vaporizers/{}", urlencoding::encode(slug));
        let vaporizer: Vaporizer = self
            .get_json(&path, &format!("vaporizer {slug}"), None)
            .await?;
        vaporizer
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Vaporizer(Box::new(vaporizer.clone())))
            .await;

        Ok(vaporizer)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for bad credentials, or an error if the
    /// request fails or the API sets no session cookie.
    #[instrument(skip(self, email, password))]
    pub async fn login(
        &self,
        email: &Email,
        password: &secrecy::SecretString,
    ) -> Result<AuthSession, ApiError> {
        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        let request = self.request(Method::POST, "/auth/login", None).json(&body);
        let raw = self.execute(request, "account").await?;
        auth_session(raw)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `Status` (e.g. 409) when the API refuses the registration,
    /// or an error if the request fails or the API sets no session cookie.
    #[instrument(skip(self, registration))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError> {
        let body = serde_json::json!({
            "email": registration.email.as_str(),
            "password": registration.password.expose_secret(),
            "displayName": registration.display_name,
        });
        let request = self
            .request(Method::POST, "/auth/register", None)
            .json(&body);
        let raw = self.execute(request, "account").await?;
        auth_session(raw)
    }

    /// End the upstream session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn logout(&self, session: &ApiSession) -> Result<(), ApiError> {
        let request = self.request(Method::POST, "/auth/logout", Some(session));
        self.execute(request, "session").await?;
        Ok(())
    }

    /// Whether the API answers at all. Used by the readiness probe.
    pub async fn is_reachable(&self) -> bool {
        match self.request(Method::GET, "/health", None).send().await {
            Ok(response) => !response.status().is_server_error(),
            Err(e) => {
                warn!(error = %e, "Remote API unreachable");
                false
            }
        }
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Evict one cached entry.
    pub async fn invalidate(&self, key: &CacheKey) {
        self.inner.cache.invalidate(key).await;
    }

    /// Evict a cached vaporizer.
    pub async fn invalidate_vaporizer(&self, slug: &str) {
        self.invalidate(&CacheKey::Vaporizer(slug.to_string()))
            .await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    /// Whether `key` is currently cached.
    pub async fn is_cached(&self, key: &CacheKey) -> bool {
        self.inner.cache.get(key).await.is_some()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Decode a JSON body. Shape mismatches are validation errors.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %truncate(body, 500),
            "Failed to decode API response"
        );
        if e.classify() == serde_json::error::Category::Data {
            ApiError::Validation(e.to_string())
        } else {
            ApiError::Parse(e)
        }
    })
}

/// Order questions and check the quiz schema.
fn prepare_quiz(quiz: &mut Quiz) -> Result<(), ApiError> {
    quiz.sort_questions();
    quiz.validate()
        .map_err(|e| ApiError::Validation(format!("quiz {}: {e}", quiz.id)))
}

fn auth_session(raw: RawResponse) -> Result<AuthSession, ApiError> {
    let envelope: UserEnvelope = decode(&raw.body)?;
    let session = raw.session.ok_or_else(|| {
        ApiError::Validation("auth response did not set a session cookie".to_string())
    })?;
    Ok(AuthSession {
        user: envelope.user,
        session,
    })
}

/// Collect `Set-Cookie` name/value pairs into a `Cookie` header value.
fn session_from_headers(headers: &HeaderMap) -> Option<ApiSession> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(ApiSession::new(pairs.join("; ")))
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| truncate(body, 200), |e| e.message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(8000));
        assert_eq!(backoff_delay(base, 5), MAX_BACKOFF);
        assert_eq!(backoff_delay(base, 40), MAX_BACKOFF);
    }

    #[test]
    fn test_session_from_set_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("vw_api=abc123; Path=/; HttpOnly"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("csrf=xyz; Secure"));
        let session = session_from_headers(&headers).unwrap();
        assert_eq!(session.expose_secret(), "vw_api=abc123; csrf=xyz");

        assert!(session_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        assert_eq!(error_message(r#"{"message": "quiz closed"}"#), "quiz closed");
        assert_eq!(error_message("<html>oops</html>"), "<html>oops</html>");
    }

    #[test]
    fn test_decode_classifies_errors() {
        let shape: Result<Quiz, _> = decode(r#"{"id": "one"}"#);
        assert!(matches!(shape, Err(ApiError::Validation(_))));

        let syntax: Result<Quiz, _> = decode("<html>");
        assert!(matches!(syntax, Err(ApiError::Parse(_))));
    }
}
