//! Fixture validation.
//!
//! Loads the directory exactly the way the storefront does at startup, so a
//! passing check means the server will boot with these files.

use std::path::Path;

use tracing::info;
use vaporwise_storefront::fixtures::{FixtureError, FixtureStore};

/// Load and validate every fixture file in `dir`.
///
/// # Errors
///
/// Returns the first read, parse or validation failure.
pub fn check(dir: &Path) -> Result<(), FixtureError> {
    info!(dir = %dir.display(), "Checking fixtures");

    let store = FixtureStore::load(dir)?;

    let public = store.templates().iter().filter(|t| t.is_public).count();
    info!(
        templates = store.templates().len(),
        public,
        featured = store.featured_templates().len(),
        demo_results = store.demo_results().len(),
        catalog = store.catalog().len(),
        "Fixtures OK"
    );

    if store.catalog().is_empty() {
        tracing::warn!("Catalog is empty; /recommend will have nothing to score");
    }

    Ok(())
}
