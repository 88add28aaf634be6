//! Static fixtures loaded at startup.
//!
//! Three YAML files live in the fixtures directory:
//!
//! ```text
//! fixtures/
//! ├── explore_templates.yaml  # community templates for /explore
//! ├── demo_results.yaml       # sample quiz results for /results
//! └── catalog.yaml            # device catalog for the legacy scorer
//! ```
//!
//! A missing file yields an empty collection; a malformed file fails startup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use vaporwise_core::TemplateId;
use vaporwise_core::explore::{CommunityTemplate, PreferenceSummary, featured};
use vaporwise_core::quiz::RecommendedVaporizer;
use vaporwise_core::scoring::CatalogEntry;

pub const TEMPLATES_FILE: &str = "explore_templates.yaml";
pub const DEMO_RESULTS_FILE: &str = "demo_results.yaml";
pub const CATALOG_FILE: &str = "catalog.yaml";

/// A sample quiz result shown to visitors who have not taken the quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoResult {
    /// URL slug, e.g. `flavor-first-beginner`.
    pub id: String,
    pub title: String,
    pub persona: String,
    pub summary: String,
    pub preferences: PreferenceSummary,
    pub recommendations: Vec<RecommendedVaporizer>,
}

/// Errors loading fixture files.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid fixture in {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// In-memory fixture data.
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    templates: Vec<CommunityTemplate>,
    demo_results: Vec<DemoResult>,
    catalog: Vec<CatalogEntry>,
}

impl FixtureStore {
    /// Load all fixtures from a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read, parsed or
    /// validated.
    pub fn load(dir: &Path) -> Result<Self, FixtureError> {
        if !dir.exists() {
            tracing::warn!("Fixtures directory does not exist: {:?}", dir);
        }

        let templates_path = dir.join(TEMPLATES_FILE);
        let templates: Vec<CommunityTemplate> = load_list(&templates_path)?;
        check_unique(&templates_path, templates.iter().map(|t| t.id))?;

        let demo_path = dir.join(DEMO_RESULTS_FILE);
        let demo_results: Vec<DemoResult> = load_list(&demo_path)?;
        check_unique(&demo_path, demo_results.iter().map(|d| d.id.as_str()))?;
        for demo in &demo_results {
            if let Some(rec) = demo
                .recommendations
                .iter()
                .find(|r| r.match_percentage > 100)
            {
                return Err(FixtureError::Invalid {
                    path: demo_path,
                    message: format!(
                        "{}: match percentage {} exceeds 100",
                        demo.id, rec.match_percentage
                    ),
                });
            }
        }

        let catalog_path = dir.join(CATALOG_FILE);
        let catalog: Vec<CatalogEntry> = load_list(&catalog_path)?;
        check_unique(&catalog_path, catalog.iter().map(|c| c.slug.as_str()))?;
        for entry in &catalog {
            entry.validate().map_err(|e| FixtureError::Invalid {
                path: catalog_path.clone(),
                message: format!("{}: {e}", entry.slug),
            })?;
        }

        tracing::info!(
            templates = templates.len(),
            demo_results = demo_results.len(),
            catalog = catalog.len(),
            "Fixtures loaded"
        );

        Ok(Self {
            templates,
            demo_results,
            catalog,
        })
    }

    /// Build a store from already-parsed data.
    #[must_use]
    pub const fn from_parts(
        templates: Vec<CommunityTemplate>,
        demo_results: Vec<DemoResult>,
        catalog: Vec<CatalogEntry>,
    ) -> Self {
        Self {
            templates,
            demo_results,
            catalog,
        }
    }

    /// All community templates, public or not.
    #[must_use]
    pub fn templates(&self) -> &[CommunityTemplate] {
        &self.templates
    }

    /// Get a public template by id.
    #[must_use]
    pub fn template(&self, id: TemplateId) -> Option<&CommunityTemplate> {
        self.templates.iter().find(|t| t.id == id && t.is_public)
    }

    /// Featured public templates.
    #[must_use]
    pub fn featured_templates(&self) -> Vec<&CommunityTemplate> {
        featured(&self.templates)
    }

    #[must_use]
    pub fn demo_results(&self) -> &[DemoResult] {
        &self.demo_results
    }

    /// Get a demo result by its slug.
    #[must_use]
    pub fn demo_result(&self, id: &str) -> Option<&DemoResult> {
        self.demo_results.iter().find(|d| d.id == id)
    }

    /// The legacy scoring catalog.
    #[must_use]
    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }
}

/// Read a YAML list, treating a missing file as empty.
fn load_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, FixtureError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Fixture file does not exist: {:?}", path);
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(FixtureError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_yaml::from_str(&content).map_err(|source| FixtureError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn check_unique<K>(path: &Path, keys: impl Iterator<Item = K>) -> Result<(), FixtureError>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    let mut seen = HashSet::new();
    for key in keys {
        if let Some(dup) = seen.replace(key) {
            return Err(FixtureError::Invalid {
                path: path.to_path_buf(),
                message: format!("duplicate id {dup}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "vaporwise-fixtures-{name}-{}",
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const TEMPLATE_YAML: &str = r"
- id: 1
  title: Flavor first
  description: Terpene-forward sessions
  author: { name: Sam Rivera, handle: '@sam' }
  likes: 12
  category: flavor
  tags: [terpenes]
  vaporizer: { slug: mighty-plus, name: Mighty+, manufacturer: Storz & Bickel }
  preferences: { experience: Beginner, usage: Daily, budget: $300-$400 }
  featured: true
";

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = std::env::temp_dir().join("vaporwise-fixtures-does-not-exist");
        let store = FixtureStore::load(&dir).unwrap();
        assert!(store.templates().is_empty());
        assert!(store.catalog().is_empty());
    }

    #[test]
    fn test_loads_templates() {
        let dir = temp_dir("templates");
        std::fs::write(dir.join(TEMPLATES_FILE), TEMPLATE_YAML).unwrap();

        let store = FixtureStore::load(&dir).unwrap();
        assert_eq!(store.templates().len(), 1);
        assert_eq!(store.featured_templates().len(), 1);
        assert!(store.template(TemplateId::new(1)).is_some());
        assert!(store.demo_results().is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = temp_dir("malformed");
        std::fs::write(dir.join(CATALOG_FILE), "- slug: [unclosed").unwrap();
        assert!(matches!(
            FixtureStore::load(&dir),
            Err(FixtureError::Parse { .. })
        ));
    }

    #[test]
    fn test_duplicate_template_ids() {
        let dir = temp_dir("duplicates");
        let doubled = format!("{TEMPLATE_YAML}{}", TEMPLATE_YAML.trim_start_matches('\n'));
        std::fs::write(dir.join(TEMPLATES_FILE), doubled).unwrap();
        assert!(matches!(
            FixtureStore::load(&dir),
            Err(FixtureError::Invalid { .. })
        ));
    }

    #[test]
    fn test_negative_catalog_price_is_invalid() {
        let dir = temp_dir("negative-price");
        let yaml = r"
- slug: free-lunch
  name: Free Lunch
  manufacturer: Nobody
  price: -20.0
  experience_levels: [beginner]
  usage_patterns: [occasional]
  form_factor: portable
  ratings: { vapor_potency: 5, comfort: 5, portability: 5, battery_life: 5, build_quality: 5, ease_of_use: 5, maintenance: 5, value: 5 }
";
        std::fs::write(dir.join(CATALOG_FILE), yaml).unwrap();

        let err = FixtureStore::load(&dir).unwrap_err();
        assert!(matches!(err, FixtureError::Invalid { .. }));
        assert!(err.to_string().contains("free-lunch"));
    }

    #[test]
    fn test_bundled_fixtures_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let store = FixtureStore::load(&dir).unwrap();
        assert!(!store.templates().is_empty());
        assert!(!store.demo_results().is_empty());
        assert!(store.catalog().len() >= 4);
    }
}
