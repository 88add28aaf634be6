//! `ApiClient` against an in-process mock of the remote API.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::json;
use vaporwise_core::quiz::{Answer, AnswerValue, AttemptResult, QuizSubmission};
use vaporwise_core::{AttemptId, Email, OptionId, QuestionId, QuizId, UserId};
use vaporwise_integration_tests::{MockApi, quiz_json};
use vaporwise_storefront::api::{ApiClient, ApiError, CacheKey};
use vaporwise_storefront::models::ApiSession;

async fn client_for(router: Router) -> (MockApi, ApiClient) {
    let mock = MockApi::spawn(router).await;
    let client = ApiClient::new(&mock.api_config()).unwrap();
    (mock, client)
}

fn mighty_plus() -> serde_json::Value {
    json!({
        "id": 7,
        "slug": "mighty-plus",
        "name": "Mighty+",
        "manufacturer": "Storz & Bickel",
        "msrp": "399.00",
        "heatingMethod": "HYBRID"
    })
}

// ============================================================================
// Errors and retries
// ============================================================================

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let router = Router::new().route(
        "/vaporizers/{slug}",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({"message": "nope"}))) }),
    );
    let (mock, client) = client_for(router).await;

    let err = client.get_vaporizer_by_slug("mighty-plus").await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(err.to_string().contains("not found"));
    assert_eq!(mock.hits.count("GET", "/vaporizers/mighty-plus"), 1);
}

#[tokio::test]
async fn test_server_error_is_retried_then_fails() {
    let router = Router::new().route(
        "/vaporizers/{slug}",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let (mock, client) = client_for(router).await;

    let err = client.get_vaporizer_by_slug("mighty-plus").await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert_eq!(mock.hits.count("GET", "/vaporizers/mighty-plus"), 3);
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let calls = Arc::new(Mutex::new(0_u32));
    let router = Router::new().route(
        "/vaporizers/{slug}",
        get(move || {
            let calls = calls.clone();
            async move {
                let mut calls = calls.lock().unwrap();
                *calls += 1;
                if *calls == 1 {
                    StatusCode::SERVICE_UNAVAILABLE.into_response()
                } else {
                    Json(mighty_plus()).into_response()
                }
            }
        }),
    );
    let (mock, client) = client_for(router).await;

    let vaporizer = client.get_vaporizer_by_slug("mighty-plus").await.unwrap();

    assert_eq!(vaporizer.name, "Mighty+");
    assert_eq!(mock.hits.count("GET", "/vaporizers/mighty-plus"), 2);
}

#[tokio::test]
async fn test_invalid_record_is_a_validation_error() {
    let router = Router::new().route(
        "/vaporizers/{slug}",
        get(|| async {
            Json(json!({"id": 1, "slug": " ", "name": "Ghost", "manufacturer": "Nobody"}))
        }),
    );
    let (mock, client) = client_for(router).await;

    let err = client.get_vaporizer_by_slug("ghost").await.unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(mock.hits.count("GET", "/vaporizers/ghost"), 1);
    assert!(!client.is_cached(&CacheKey::Vaporizer("ghost".into())).await);
}

#[tokio::test]
async fn test_wrong_shape_is_a_validation_error() {
    let router = Router::new().route(
        "/quizzes/{id}",
        get(|| async { Json(json!({"id": 1, "title": "No questions field"})) }),
    );
    let (_mock, client) = client_for(router).await;

    let err = client.get_quiz(QuizId::new(1)).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_reads_are_cached() {
    let router = Router::new().route(
        "/vaporizers/{slug}",
        get(|| async { Json(mighty_plus()) }),
    );
    let (mock, client) = client_for(router).await;

    let first = client.get_vaporizer_by_slug("mighty-plus").await.unwrap();
    let second = client.get_vaporizer_by_slug("mighty-plus").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(mock.hits.count("GET", "/vaporizers/mighty-plus"), 1);

    client.invalidate_vaporizer("mighty-plus").await;
    client.get_vaporizer_by_slug("mighty-plus").await.unwrap();
    assert_eq!(mock.hits.count("GET", "/vaporizers/mighty-plus"), 2);
}

#[tokio::test]
async fn test_submit_invalidates_quiz_cache() {
    let router = Router::new()
        .route("/quizzes/{id}", get(|| async { Json(quiz_json()) }))
        .route(
            "/quizzes/{id}/attempts",
            post(|| async {
                (
                    StatusCode::ACCEPTED,
                    Json(json!({"status": "PROCESSING", "attemptId": 9})),
                )
            }),
        );
    let (mock, client) = client_for(router).await;

    client.get_quiz(QuizId::new(1)).await.unwrap();
    assert!(client.is_cached(&CacheKey::Quiz(QuizId::new(1))).await);

    let submission = QuizSubmission {
        quiz_id: QuizId::new(1),
        user_id: UserId::new(2),
        answers: vec![Answer {
            question_id: QuestionId::new(1),
            value: AnswerValue::Single {
                option_id: OptionId::new(10),
            },
        }],
    };
    let result = client
        .submit_quiz_answers(&submission, &ApiSession::new("vw_api=abc"))
        .await
        .unwrap();

    assert_eq!(result.attempt_id(), AttemptId::new(9));
    assert!(matches!(result, AttemptResult::Processing { .. }));
    assert_eq!(mock.hits.count("GET", "/quizzes/1"), 1);
    assert_eq!(mock.hits.count("POST", "/quizzes/1/attempts"), 1);
    assert!(!client.is_cached(&CacheKey::Quiz(QuizId::new(1))).await);
}

#[tokio::test]
async fn test_invalid_submission_never_reaches_the_api() {
    let router = Router::new()
        .route("/quizzes/{id}", get(|| async { Json(quiz_json()) }))
        .route(
            "/quizzes/{id}/attempts",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
    let (mock, client) = client_for(router).await;

    let submission = QuizSubmission {
        quiz_id: QuizId::new(1),
        user_id: UserId::new(2),
        answers: vec![],
    };
    let err = client
        .submit_quiz_answers(&submission, &ApiSession::new("vw_api=abc"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Submission(_)));
    assert_eq!(mock.hits.count("POST", "/quizzes/1/attempts"), 0);
}

// ============================================================================
// Credentials
// ============================================================================

#[tokio::test]
async fn test_session_cookie_is_forwarded() {
    let seen = Arc::new(Mutex::new(None::<String>));
    let recorder = seen.clone();
    let router = Router::new().route(
        "/attempts/{id}",
        get(move |headers: HeaderMap| {
            let recorder = recorder.clone();
            async move {
                *recorder.lock().unwrap() = headers
                    .get(header::COOKIE)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                Json(json!({"status": "PROCESSING", "attemptId": 4}))
            }
        }),
    );
    let (_mock, client) = client_for(router).await;

    client
        .get_quiz_attempt(AttemptId::new(4), &ApiSession::new("vw_api=s3cr3t"))
        .await
        .unwrap();

    assert_eq!(seen.lock().unwrap().as_deref(), Some("vw_api=s3cr3t"));
}

#[tokio::test]
async fn test_login_captures_upstream_session() {
    let router = Router::new().route(
        "/auth/login",
        post(|| async {
            (
                [(header::SET_COOKIE, "vw_api=fresh; HttpOnly; Path=/")],
                Json(json!({"user": {"id": 3, "email": "casey@example.com"}})),
            )
        }),
    );
    let (_mock, client) = client_for(router).await;

    let email = Email::parse("casey@example.com").unwrap();
    let session = client
        .login(&email, &secrecy::SecretString::from("hunter22".to_string()))
        .await
        .unwrap();

    assert_eq!(session.user.id, UserId::new(3));
    assert_eq!(session.session.expose_secret(), "vw_api=fresh");
}

#[tokio::test]
async fn test_login_is_not_retried() {
    let router = Router::new().route(
        "/auth/login",
        post(|| async { StatusCode::BAD_GATEWAY }),
    );
    let (mock, client) = client_for(router).await;

    let email = Email::parse("casey@example.com").unwrap();
    let err = client
        .login(&email, &secrecy::SecretString::from("hunter22".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 502, .. }));
    assert_eq!(mock.hits.count("POST", "/auth/login"), 1);
}
