//! Vaporizer records as served by the remote API.
//!
//! These are display-oriented records: fetched, validated, rendered. The
//! storefront never mutates them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{Price, VaporizerId};

/// How the device heats material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeatingMethod {
    Conduction,
    Convection,
    Hybrid,
}

impl HeatingMethod {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Conduction => "Conduction",
            Self::Convection => "Convection",
            Self::Hybrid => "Hybrid",
        }
    }
}

/// How much control the user has over temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemperatureControl {
    /// Degree-by-degree control.
    Precise,
    /// A handful of preset temperatures.
    Presets,
    /// Single fixed temperature.
    Fixed,
}

impl TemperatureControl {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Precise => "Precise control",
            Self::Presets => "Preset temperatures",
            Self::Fixed => "Fixed temperature",
        }
    }
}

/// A vaporizer product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vaporizer {
    pub id: VaporizerId,
    pub slug: String,
    pub name: String,
    pub manufacturer: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub msrp: Option<Decimal>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub heating_method: Option<HeatingMethod>,
    #[serde(default)]
    pub temperature_control: Option<TemperatureControl>,
    #[serde(default)]
    pub expert_rating: Option<String>,
    #[serde(default)]
    pub user_rating: Option<String>,
    #[serde(default)]
    pub best_for: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Shape errors in a vaporizer record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaporizerError {
    #[error("vaporizer slug cannot be empty")]
    EmptySlug,
    #[error("vaporizer name cannot be empty")]
    EmptyName,
    #[error("invalid image url {0:?}")]
    InvalidImageUrl(String),
    #[error("msrp cannot be negative")]
    NegativeMsrp,
}

impl Vaporizer {
    /// Check the fields the API contract guarantees but JSON cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), VaporizerError> {
        if self.slug.trim().is_empty() {
            return Err(VaporizerError::EmptySlug);
        }
        if self.name.trim().is_empty() {
            return Err(VaporizerError::EmptyName);
        }
        if self.msrp.is_some_and(|m| m.is_sign_negative()) {
            return Err(VaporizerError::NegativeMsrp);
        }
        if let Some(url) = &self.image_url {
            validate_image_url(url)?;
        }
        Ok(())
    }

    /// MSRP as a USD [`Price`].
    #[must_use]
    pub fn price(&self) -> Option<Price> {
        self.msrp.map(Price::usd)
    }

    /// MSRP formatted for display.
    #[must_use]
    pub fn display_price(&self) -> String {
        self.price()
            .map_or_else(|| "Price unavailable".to_string(), |p| p.display())
    }

    /// Compact summary embedded in templates and results.
    #[must_use]
    pub fn summary(&self) -> VaporizerSummary {
        VaporizerSummary {
            slug: self.slug.clone(),
            name: self.name.clone(),
            manufacturer: self.manufacturer.clone(),
            image_url: self.image_url.clone(),
            match_percentage: None,
        }
    }
}

/// Image URLs must be absolute http(s) URLs or site-relative paths.
fn validate_image_url(raw: &str) -> Result<(), VaporizerError> {
    if raw.starts_with('/') && !raw.starts_with("//") {
        return Ok(());
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(VaporizerError::InvalidImageUrl(raw.to_string())),
    }
}

/// A vaporizer as embedded in community templates and quiz results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaporizerSummary {
    pub slug: String,
    pub name: String,
    pub manufacturer: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub match_percentage: Option<u8>,
}
