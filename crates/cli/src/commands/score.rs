//! Run the legacy weighted-sum scorer from the command line.

use std::fmt::Write as _;
use std::path::Path;

use thiserror::Error;
use tracing::info;
use vaporwise_core::preferences::{PreferencesError, UserPreferences};
use vaporwise_core::scoring::{self, CatalogEntry, CatalogError, ScoredEntry};

/// Errors running the scorer.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("failed to read {0}: {1}")]
    Read(String, #[source] std::io::Error),

    #[error("failed to parse {0}: {1}")]
    Parse(String, #[source] serde_yaml::Error),

    #[error("invalid preferences: {0}")]
    Preferences(#[from] PreferencesError),

    #[error("catalog entry {slug}: {source}")]
    Catalog {
        slug: String,
        #[source]
        source: CatalogError,
    },

    #[error("catalog is empty")]
    EmptyCatalog,
}

async fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ScoreError> {
    let name = path.display().to_string();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ScoreError::Read(name.clone(), e))?;
    serde_yaml::from_str(&content).map_err(|e| ScoreError::Parse(name, e))
}

/// Score `catalog` against `preferences` and print the top `limit` matches.
///
/// # Errors
///
/// Returns an error if either file is unreadable or invalid, or the catalog is empty.
pub async fn run(preferences: &Path, catalog: &Path, limit: usize) -> Result<(), ScoreError> {
    let prefs: UserPreferences = read_yaml(preferences).await?;
    prefs.validate()?;

    let catalog: Vec<CatalogEntry> = read_yaml(catalog).await?;
    check_catalog(&catalog)?;

    info!(entries = catalog.len(), "Scoring catalog");

    let ranked = scoring::rank(&catalog, &prefs);

    #[allow(clippy::print_stdout)]
    {
        print!("{}", render(&ranked, limit));
    }
    Ok(())
}

/// Reject an empty catalog or any entry with a bad price or rating.
fn check_catalog(catalog: &[CatalogEntry]) -> Result<(), ScoreError> {
    for entry in catalog {
        entry.validate().map_err(|source| ScoreError::Catalog {
            slug: entry.slug.clone(),
            source,
        })?;
    }
    if catalog.is_empty() {
        return Err(ScoreError::EmptyCatalog);
    }
    Ok(())
}

/// Plain-text ranking table.
fn render(ranked: &[ScoredEntry<'_>], limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4} {:<22} {:>6} {:>5}  exp  use  port  budget  prio",
        "#", "vaporizer", "price", "match"
    );
    for (position, scored) in ranked.iter().take(limit).enumerate() {
        let s = &scored.score;
        let _ = writeln!(
            out,
            "{:<4} {:<22} {:>6.0} {:>4}%  {:>3.0}  {:>3.0}  {:>4.0}  {:>6.1}  {:>4.1}",
            position + 1,
            scored.entry.name,
            scored.entry.price,
            s.percentage(),
            s.experience,
            s.usage,
            s.portability,
            s.budget,
            s.priorities,
        );
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const CATALOG: &str = r"
- slug: pax-plus
  name: PAX Plus
  manufacturer: PAX Labs
  price: 199.0
  experience_levels: [beginner]
  usage_patterns: [occasional]
  form_factor: portable
  ratings: { vapor_potency: 6, comfort: 7, portability: 10, battery_life: 6, build_quality: 8, ease_of_use: 9, maintenance: 9, value: 7 }
- slug: volcano-hybrid
  name: Volcano Hybrid
  manufacturer: Storz & Bickel
  price: 699.0
  experience_levels: [intermediate, advanced]
  usage_patterns: [heavy]
  form_factor: desktop
  ratings: { vapor_potency: 10, comfort: 10, portability: 1, battery_life: 10, build_quality: 10, ease_of_use: 8, maintenance: 7, value: 5 }
";

    const PREFS: &str = r"
experience: beginner
usage: occasional
portability: portable
budget: 250
";

    #[test]
    fn test_render_respects_limit_and_order() {
        let catalog: Vec<CatalogEntry> = serde_yaml::from_str(CATALOG).unwrap();
        let prefs: UserPreferences = serde_yaml::from_str(PREFS).unwrap();
        let ranked = scoring::rank(&catalog, &prefs);

        let table = render(&ranked, 1);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("PAX Plus"));
        assert!(!table.contains("Volcano"));
    }

    #[test]
    fn test_check_catalog_rejects_negative_price() {
        let mut catalog: Vec<CatalogEntry> = serde_yaml::from_str(CATALOG).unwrap();
        assert!(check_catalog(&catalog).is_ok());

        catalog[1].price = -699.0;
        let err = check_catalog(&catalog).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::Catalog {
                ref slug,
                source: CatalogError::InvalidPrice(_),
            } if slug == "volcano-hybrid"
        ));
        assert!(matches!(check_catalog(&[]), Err(ScoreError::EmptyCatalog)));
    }
}
