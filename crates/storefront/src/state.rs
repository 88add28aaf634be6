//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::fixtures::{FixtureError, FixtureStore};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to create API client: {0}")]
    Api(#[from] ApiError),
    #[error("failed to load fixtures: {0}")]
    Fixtures(#[from] FixtureError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the API client, fixtures and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    fixtures: FixtureStore,
}

impl AppState {
    /// Create a new application state, loading fixtures from
    /// `config.fixtures_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built or a fixture file
    /// is malformed.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let fixtures = FixtureStore::load(&config.fixtures_dir)?;
        Self::with_fixtures(config, fixtures)
    }

    /// Create application state with pre-loaded fixtures.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn with_fixtures(
        config: StorefrontConfig,
        fixtures: FixtureStore,
    ) -> Result<Self, StateError> {
        let api = ApiClient::new(&config.api)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                fixtures,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the remote API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the static fixtures.
    #[must_use]
    pub fn fixtures(&self) -> &FixtureStore {
        &self.inner.fixtures
    }
}
