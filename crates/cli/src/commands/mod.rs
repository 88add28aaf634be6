//! Subcommand implementations.

use std::path::PathBuf;

pub mod fixtures;
pub mod quiz;
pub mod score;

/// Fixtures directory from `STOREFRONT_FIXTURES_DIR`, matching the storefront's default.
pub fn fixtures_dir() -> PathBuf {
    dotenvy::dotenv().ok();
    std::env::var("STOREFRONT_FIXTURES_DIR")
        .map_or_else(|_| PathBuf::from("crates/storefront/fixtures"), PathBuf::from)
}
