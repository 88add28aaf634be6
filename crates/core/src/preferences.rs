//! Preferences collected by the legacy recommendation form.

use serde::{Deserialize, Serialize};

/// How experienced the user is with dry-herb vaporizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    const fn tier(self) -> u8 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
        }
    }

    /// Whether `other` is one tier above or below.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.tier().abs_diff(other.tier()) == 1
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

/// How often the user expects to use the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsagePattern {
    Occasional,
    Regular,
    Heavy,
}

impl UsagePattern {
    pub const ALL: [Self; 3] = [Self::Occasional, Self::Regular, Self::Heavy];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Occasional => "occasional",
            Self::Regular => "regular",
            Self::Heavy => "heavy",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Occasional => "A few times a month",
            Self::Regular => "A few times a week",
            Self::Heavy => "Daily",
        }
    }
}

/// Desktop, portable, or no preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortabilityPreference {
    Desktop,
    Portable,
    Either,
}

impl PortabilityPreference {
    pub const ALL: [Self; 3] = [Self::Desktop, Self::Portable, Self::Either];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Portable => "portable",
            Self::Either => "either",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Desktop => "Desktop",
            Self::Portable => "Portable",
            Self::Either => "No preference",
        }
    }
}

/// Importance (or rating) on a 1-10 scale for each scoring dimension.
///
/// The same shape carries the user's priority weights and a catalog entry's
/// ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Priorities {
    pub vapor_potency: u8,
    pub comfort: u8,
    pub portability: u8,
    pub battery_life: u8,
    pub build_quality: u8,
    pub ease_of_use: u8,
    pub maintenance: u8,
    pub value: u8,
}

impl Default for Priorities {
    fn default() -> Self {
        Self::uniform(5)
    }
}

impl Priorities {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Field names with their display labels, in a fixed order.
    pub const DIMENSIONS: [(&'static str, &'static str); 8] = [
        ("vapor_potency", "Vapor potency"),
        ("comfort", "Comfort"),
        ("portability", "Portability"),
        ("battery_life", "Battery life"),
        ("build_quality", "Build quality"),
        ("ease_of_use", "Ease of use"),
        ("maintenance", "Maintenance"),
        ("value", "Value"),
    ];

    /// Every dimension set to the same value.
    #[must_use]
    pub const fn uniform(value: u8) -> Self {
        Self {
            vapor_potency: value,
            comfort: value,
            portability: value,
            battery_life: value,
            build_quality: value,
            ease_of_use: value,
            maintenance: value,
            value,
        }
    }

    /// Values in [`Self::DIMENSIONS`] order.
    #[must_use]
    pub const fn values(&self) -> [u8; 8] {
        [
            self.vapor_potency,
            self.comfort,
            self.portability,
            self.battery_life,
            self.build_quality,
            self.ease_of_use,
            self.maintenance,
            self.value,
        ]
    }

    /// Set one dimension by field name.
    ///
    /// # Errors
    ///
    /// Returns [`PreferencesError::UnknownDimension`] for an unknown name.
    pub fn set(&mut self, name: &str, value: u8) -> Result<(), PreferencesError> {
        let slot = match name {
            "vapor_potency" => &mut self.vapor_potency,
            "comfort" => &mut self.comfort,
            "portability" => &mut self.portability,
            "battery_life" => &mut self.battery_life,
            "build_quality" => &mut self.build_quality,
            "ease_of_use" => &mut self.ease_of_use,
            "maintenance" => &mut self.maintenance,
            "value" => &mut self.value,
            other => return Err(PreferencesError::UnknownDimension(other.to_string())),
        };
        *slot = value;
        Ok(())
    }

    /// Check every value is within 1-10.
    ///
    /// # Errors
    ///
    /// Returns the first dimension out of range.
    pub fn validate(&self) -> Result<(), PreferencesError> {
        for ((name, _), value) in Self::DIMENSIONS.iter().zip(self.values()) {
            if !(Self::MIN..=Self::MAX).contains(&value) {
                return Err(PreferencesError::OutOfRange {
                    dimension: name,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Labels of the highest-valued dimensions, strongest first.
    #[must_use]
    pub fn top(&self, count: usize) -> Vec<&'static str> {
        let mut ranked: Vec<(&'static str, u8)> = Self::DIMENSIONS
            .iter()
            .map(|(_, label)| *label)
            .zip(self.values())
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().take(count).map(|(label, _)| label).collect()
    }
}

/// Errors in user-supplied preferences.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreferencesError {
    #[error("{dimension} must be between 1 and 10, got {value}")]
    OutOfRange { dimension: &'static str, value: u8 },
    #[error("unknown priority {0:?}")]
    UnknownDimension(String),
    #[error("budget must be a non-negative amount")]
    InvalidBudget,
}

/// Everything the legacy scorer needs to know about the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserPreferences {
    pub experience: ExperienceLevel,
    pub usage: UsagePattern,
    pub portability: PortabilityPreference,
    /// Budget in USD.
    pub budget: f64,
    #[serde(default)]
    pub priorities: Priorities,
}

impl UserPreferences {
    /// # Errors
    ///
    /// Returns an error for a negative or non-finite budget or a priority
    /// outside 1-10.
    pub fn validate(&self) -> Result<(), PreferencesError> {
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(PreferencesError::InvalidBudget);
        }
        self.priorities.validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_tiers() {
        use ExperienceLevel::*;
        assert!(Beginner.is_adjacent(Intermediate));
        assert!(Advanced.is_adjacent(Intermediate));
        assert!(!Beginner.is_adjacent(Advanced));
        assert!(!Beginner.is_adjacent(Beginner));
    }

    #[test]
    fn test_priorities_set_and_validate() {
        let mut priorities = Priorities::default();
        priorities.set("battery_life", 9).unwrap();
        assert_eq!(priorities.battery_life, 9);
        assert!(priorities.validate().is_ok());

        assert!(matches!(
            priorities.set("cupholders", 3),
            Err(PreferencesError::UnknownDimension(_))
        ));

        priorities.comfort = 11;
        assert_eq!(
            priorities.validate(),
            Err(PreferencesError::OutOfRange {
                dimension: "comfort",
                value: 11
            })
        );
    }

    #[test]
    fn test_top_priorities_are_stable() {
        let mut priorities = Priorities::uniform(3);
        priorities.value = 10;
        priorities.comfort = 8;
        assert_eq!(priorities.top(3), vec!["Value", "Comfort", "Vapor potency"]);
    }

    #[test]
    fn test_preferences_from_yaml_shape() {
        let prefs: UserPreferences = serde_json::from_str(
            r#"{"experience": "beginner", "usage": "regular", "portability": "either", "budget": 250}"#,
        )
        .unwrap();
        assert_eq!(prefs.priorities, Priorities::default());
        assert!(prefs.validate().is_ok());
    }

    #[test]
    fn test_negative_budget_is_rejected() {
        let prefs = UserPreferences {
            experience: ExperienceLevel::Advanced,
            usage: UsagePattern::Heavy,
            portability: PortabilityPreference::Desktop,
            budget: -1.0,
            priorities: Priorities::default(),
        };
        assert_eq!(prefs.validate(), Err(PreferencesError::InvalidBudget));
    }
}
