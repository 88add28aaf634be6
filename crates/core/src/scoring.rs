//! Legacy weighted-sum recommendation scorer.
//!
//! Ranks a static catalog against [`UserPreferences`] without calling the
//! remote API. Each catalog entry earns points in five components:
//!
//! | Component   | Max |
//! |-------------|-----|
//! | Experience  | 20  |
//! | Usage       | 15  |
//! | Portability | 25  |
//! | Budget      | 20  |
//! | Priorities  | 20  |

use serde::{Deserialize, Serialize};

use crate::preferences::{
    ExperienceLevel, PortabilityPreference, Priorities, PreferencesError, UsagePattern,
    UserPreferences,
};

pub const EXPERIENCE_POINTS: f64 = 20.0;
pub const USAGE_POINTS: f64 = 15.0;
pub const PORTABILITY_POINTS: f64 = 25.0;
pub const BUDGET_POINTS: f64 = 20.0;
pub const PRIORITY_POINTS: f64 = 20.0;

/// Points for a product priced exactly at the budget.
const BUDGET_FLOOR: f64 = 5.0;

/// Number of runner-up recommendations.
pub const MAX_ALTERNATIVES: usize = 3;

/// Physical form factor of a catalog device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFactor {
    Desktop,
    Portable,
}

impl FormFactor {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Desktop => "Desktop",
            Self::Portable => "Portable",
        }
    }
}

/// One device in the static scoring catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogEntry {
    pub slug: String,
    pub name: String,
    pub manufacturer: String,
    /// Price in USD.
    pub price: f64,
    pub experience_levels: Vec<ExperienceLevel>,
    pub usage_patterns: Vec<UsagePattern>,
    pub form_factor: FormFactor,
    pub ratings: Priorities,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

impl CatalogEntry {
    /// # Errors
    ///
    /// Returns an error for a negative or non-finite price, or a rating
    /// outside 1-10.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CatalogError::InvalidPrice(self.price));
        }
        self.ratings.validate()?;
        Ok(())
    }
}

/// Errors in a catalog entry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("price must be a non-negative amount, got {0}")]
    InvalidPrice(f64),
    #[error(transparent)]
    Ratings(#[from] PreferencesError),
}

/// Per-component points for one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchScore {
    pub experience: f64,
    pub usage: f64,
    pub portability: f64,
    pub budget: f64,
    pub priorities: f64,
}

impl MatchScore {
    /// Sum of all components, clamped to 0-100.
    #[must_use]
    pub fn total(&self) -> f64 {
        (self.experience + self.usage + self.portability + self.budget + self.priorities)
            .clamp(0.0, 100.0)
    }

    /// Total rounded to a whole percentage.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentage(&self) -> u8 {
        // total() is clamped to 0..=100, so the cast cannot overflow.
        self.total().round() as u8
    }
}

/// A catalog entry with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry<'a> {
    pub entry: &'a CatalogEntry,
    pub score: MatchScore,
}

/// Best match plus runners-up.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation<'a> {
    pub primary: ScoredEntry<'a>,
    pub alternatives: Vec<ScoredEntry<'a>>,
}

/// Score one catalog entry.
#[must_use]
pub fn score(entry: &CatalogEntry, prefs: &UserPreferences) -> MatchScore {
    MatchScore {
        experience: experience_points(entry, prefs.experience),
        usage: usage_points(entry, prefs.usage),
        portability: portability_points(entry.form_factor, prefs.portability),
        budget: budget_points(entry.price, prefs.budget),
        priorities: priority_points(&entry.ratings, &prefs.priorities),
    }
}

/// Score every entry, best first. Ties keep catalog order.
#[must_use]
pub fn rank<'a>(catalog: &'a [CatalogEntry], prefs: &UserPreferences) -> Vec<ScoredEntry<'a>> {
    let mut scored: Vec<ScoredEntry<'a>> = catalog
        .iter()
        .map(|entry| ScoredEntry {
            entry,
            score: score(entry, prefs),
        })
        .collect();
    scored.sort_by(|a, b| b.score.total().total_cmp(&a.score.total()));
    scored
}

/// Pick the best match and up to three alternatives.
///
/// Returns `None` for an empty catalog.
#[must_use]
pub fn recommend<'a>(
    catalog: &'a [CatalogEntry],
    prefs: &UserPreferences,
) -> Option<Recommendation<'a>> {
    let mut ranked = rank(catalog, prefs).into_iter();
    let primary = ranked.next()?;
    Some(Recommendation {
        primary,
        alternatives: ranked.take(MAX_ALTERNATIVES).collect(),
    })
}

fn experience_points(entry: &CatalogEntry, level: ExperienceLevel) -> f64 {
    if entry.experience_levels.contains(&level) {
        EXPERIENCE_POINTS
    } else if entry
        .experience_levels
        .iter()
        .any(|l| l.is_adjacent(level))
    {
        EXPERIENCE_POINTS / 2.0
    } else {
        0.0
    }
}

fn usage_points(entry: &CatalogEntry, usage: UsagePattern) -> f64 {
    if entry.usage_patterns.contains(&usage) {
        USAGE_POINTS
    } else {
        0.0
    }
}

const fn portability_points(form: FormFactor, pref: PortabilityPreference) -> f64 {
    match (pref, form) {
        (PortabilityPreference::Either, _)
        | (PortabilityPreference::Desktop, FormFactor::Desktop)
        | (PortabilityPreference::Portable, FormFactor::Portable) => PORTABILITY_POINTS,
        _ => 0.0,
    }
}

fn budget_points(price: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        return if price <= 0.0 { BUDGET_POINTS } else { 0.0 };
    }
    if price > budget {
        return 0.0;
    }
    let headroom = (budget - price.max(0.0)) / budget;
    BUDGET_FLOOR + (BUDGET_POINTS - BUDGET_FLOOR) * headroom
}

fn priority_points(ratings: &Priorities, weights: &Priorities) -> f64 {
    let weights = weights.values();
    let total_weight: f64 = weights.iter().copied().map(f64::from).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = weights
        .iter()
        .zip(ratings.values())
        .map(|(&w, r)| f64::from(w) / total_weight * f64::from(r.min(Priorities::MAX)))
        .sum();
    PRIORITY_POINTS * weighted / f64::from(Priorities::MAX)
}
