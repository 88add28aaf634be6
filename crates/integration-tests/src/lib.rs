//! Integration tests for Vaporwise.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vaporwise-integration-tests
//! ```
//!
//! No external services are needed: the remote API is replaced by an
//! in-process axum server bound to an ephemeral port.
//!
//! # Test Categories
//!
//! - `api_client` - `ApiClient` retry, caching, validation and cookie forwarding
//! - `storefront_routes` - The full storefront router driven with `oneshot`

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use url::Url;
use vaporwise_storefront::config::{ApiConfig, StorefrontConfig};
use vaporwise_storefront::state::AppState;

/// Requests seen by the mock API, keyed by `METHOD path`.
#[derive(Clone, Default)]
pub struct Hits(Arc<Mutex<HashMap<String, usize>>>);

impl Hits {
    /// How many times `METHOD path` was requested.
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        let hits = self.0.lock().unwrap();
        hits.get(&format!("{method} {path}")).copied().unwrap_or(0)
    }

    fn record(&self, method: &str, path: &str) {
        let mut hits = self.0.lock().unwrap();
        *hits.entry(format!("{method} {path}")).or_default() += 1;
    }
}

/// A stand-in for the remote recommendation API.
pub struct MockApi {
    pub base_url: Url,
    pub hits: Hits,
}

impl MockApi {
    /// Serve `router` on `127.0.0.1:0`, counting every request.
    pub async fn spawn(router: Router) -> Self {
        let hits = Hits::default();
        let recorder = hits.clone();

        let app = router.layer(middleware::from_fn(move |req: Request, next: Next| {
            let recorder = recorder.clone();
            async move {
                recorder.record(req.method().as_str(), req.uri().path());
                next.run(req).await
            }
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}")).unwrap(),
            hits,
        }
    }

    /// Client settings pointed at this mock, with millisecond backoff.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            retry_base_delay: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
            ..ApiConfig::new(self.base_url.clone())
        }
    }
}

/// The fixtures bundled with the storefront crate.
#[must_use]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/fixtures")
}

/// Storefront state backed by the bundled fixtures and the API at `api_url`.
#[must_use]
pub fn test_state(api_url: &Url) -> AppState {
    let api_url = api_url.to_string();
    let fixtures = fixtures_dir().display().to_string();
    let config = StorefrontConfig::from_lookup(|key| match key {
        "VAPORWISE_API_URL" => Some(api_url.clone()),
        "STOREFRONT_FIXTURES_DIR" => Some(fixtures.clone()),
        "API_RETRY_BASE_MS" => Some("1".to_string()),
        "API_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap();
    AppState::new(config).unwrap()
}

/// A minimal valid quiz document.
#[must_use]
pub fn quiz_json() -> serde_json::Value {
    serde_json::json!({
        "id": 1,
        "title": "Find your vaporizer",
        "description": "Five questions, two minutes.",
        "questions": [
            {
                "id": 1,
                "order": 1,
                "prompt": "How experienced are you?",
                "type": "SINGLE_SELECT",
                "options": [
                    {"id": 10, "label": "Just starting", "value": "beginner"},
                    {"id": 11, "label": "Seasoned", "value": "advanced"}
                ]
            }
        ]
    })
}
