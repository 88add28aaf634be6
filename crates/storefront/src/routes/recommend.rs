//! Legacy recommendation form.
//!
//! Scores the static catalog against the submitted preferences without
//! touching the remote API. Useful when the API is down and as a quick
//! "what fits me" tool.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use vaporwise_core::controls::RangeSlider;
use vaporwise_core::preferences::{
    ExperienceLevel, PortabilityPreference, Priorities, UsagePattern, UserPreferences,
};
use vaporwise_core::scoring::{self, ScoredEntry};

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::components::RangeSliderView;
use crate::routes::explore::FilterOption;
use crate::routes::form::FormPairs;
use crate::state::AppState;

/// Budget slider bounds, USD.
const BUDGET_MIN: f64 = 0.0;
const BUDGET_MAX: f64 = 1000.0;
const BUDGET_STEP: f64 = 25.0;
const DEFAULT_BUDGET: f64 = 300.0;

/// Prefix of the priority slider fields.
const PRIORITY_PREFIX: &str = "priority-";

/// One component of a match score.
#[derive(Debug, Clone)]
pub struct ScorePart {
    pub label: &'static str,
    pub points: String,
    pub max: f64,
}

/// A scored catalog entry for display.
#[derive(Debug, Clone)]
pub struct MatchView {
    pub slug: String,
    pub name: String,
    pub manufacturer: String,
    pub price: String,
    pub form_factor: &'static str,
    pub image_url: Option<String>,
    pub highlights: Vec<String>,
    pub percentage: u8,
    pub breakdown: Vec<ScorePart>,
}

impl From<&ScoredEntry<'_>> for MatchView {
    fn from(scored: &ScoredEntry<'_>) -> Self {
        let entry = scored.entry;
        let s = &scored.score;
        let part = |label, points: f64, max| ScorePart {
            label,
            points: format!("{points:.1}"),
            max,
        };
        Self {
            slug: entry.slug.clone(),
            name: entry.name.clone(),
            manufacturer: entry.manufacturer.clone(),
            price: format!("${:.0}", entry.price),
            form_factor: entry.form_factor.label(),
            image_url: entry.image_url.clone(),
            highlights: entry.highlights.clone(),
            percentage: s.percentage(),
            breakdown: vec![
                part("Experience", s.experience, scoring::EXPERIENCE_POINTS),
                part("Usage", s.usage, scoring::USAGE_POINTS),
                part("Portability", s.portability, scoring::PORTABILITY_POINTS),
                part("Budget", s.budget, scoring::BUDGET_POINTS),
                part("Priorities", s.priorities, scoring::PRIORITY_POINTS),
            ],
        }
    }
}

/// Recommendation page template.
#[derive(Template, WebTemplate)]
#[template(path = "recommend.html")]
pub struct RecommendTemplate {
    pub user: Option<String>,
    pub experience_options: Vec<FilterOption>,
    pub usage_options: Vec<FilterOption>,
    pub portability_options: Vec<FilterOption>,
    /// Budget first, then one slider per priority.
    pub sliders: Vec<RangeSliderView>,
    pub error: Option<String>,
    pub submitted: bool,
    pub primary: Option<MatchView>,
    pub alternatives: Vec<MatchView>,
}

impl RecommendTemplate {
    /// The form, pre-filled from `prefs`.
    fn form(user: Option<String>, prefs: &UserPreferences) -> Self {
        let budget_slider = RangeSlider {
            min: BUDGET_MIN,
            max: BUDGET_MAX,
            step: BUDGET_STEP,
        };
        let priority_slider = RangeSlider {
            min: f64::from(Priorities::MIN),
            max: f64::from(Priorities::MAX),
            step: 1.0,
        };

        Self {
            user,
            experience_options: ExperienceLevel::ALL
                .iter()
                .map(|e| FilterOption {
                    value: e.as_str(),
                    label: e.label(),
                    selected: *e == prefs.experience,
                })
                .collect(),
            usage_options: UsagePattern::ALL
                .iter()
                .map(|u| FilterOption {
                    value: u.as_str(),
                    label: u.label(),
                    selected: *u == prefs.usage,
                })
                .collect(),
            portability_options: PortabilityPreference::ALL
                .iter()
                .map(|p| FilterOption {
                    value: p.as_str(),
                    label: p.label(),
                    selected: *p == prefs.portability,
                })
                .collect(),
            sliders: std::iter::once(RangeSliderView::new(
                "budget".to_string(),
                "Budget".to_string(),
                budget_slider,
                prefs.budget,
                Some("USD".to_string()),
            ))
            .chain(
                Priorities::DIMENSIONS
                    .iter()
                    .zip(prefs.priorities.values())
                    .map(|((field, label), value)| {
                        RangeSliderView::new(
                            format!("{PRIORITY_PREFIX}{field}"),
                            (*label).to_string(),
                            priority_slider,
                            f64::from(value),
                            None,
                        )
                    }),
            )
            .collect(),
            error: None,
            submitted: false,
            primary: None,
            alternatives: Vec::new(),
        }
    }
}

/// Starting point for the form.
fn default_preferences() -> UserPreferences {
    UserPreferences {
        experience: ExperienceLevel::Beginner,
        usage: UsagePattern::Regular,
        portability: PortabilityPreference::Either,
        budget: DEFAULT_BUDGET,
        priorities: Priorities::default(),
    }
}

/// Read preferences from the submitted form.
///
/// Missing priorities keep their default weight.
fn parse_preferences(form: &FormPairs) -> Result<UserPreferences, String> {
    let experience = ExperienceLevel::ALL
        .into_iter()
        .find(|e| form.first("experience") == Some(e.as_str()))
        .ok_or("Choose your experience level")?;
    let usage = UsagePattern::ALL
        .into_iter()
        .find(|u| form.first("usage") == Some(u.as_str()))
        .ok_or("Choose how often you use a vaporizer")?;
    let portability = PortabilityPreference::ALL
        .into_iter()
        .find(|p| form.first("portability") == Some(p.as_str()))
        .ok_or("Choose a form factor")?;
    let budget = form
        .parse::<f64>("budget")
        .ok_or("Enter a budget in dollars")?;

    let mut priorities = Priorities::default();
    for (field, label) in Priorities::DIMENSIONS {
        let key = format!("{PRIORITY_PREFIX}{field}");
        if form.first(&key).is_none() {
            continue;
        }
        let value = form
            .parse::<u8>(&key)
            .ok_or_else(|| format!("{label} must be a whole number from 1 to 10"))?;
        priorities.set(field, value).map_err(|e| e.to_string())?;
    }

    let prefs = UserPreferences {
        experience,
        usage,
        portability,
        budget,
        priorities,
    };
    prefs.validate().map_err(|e| e.to_string())?;
    Ok(prefs)
}

/// Display the preferences form.
pub async fn form_page(auth: OptionalAuth) -> impl IntoResponse {
    RecommendTemplate::form(auth.greeting(), &default_preferences())
}

/// Score the catalog against the submitted preferences.
pub async fn submit(
    State(state): State<AppState>,
    auth: OptionalAuth,
    form: Form<Vec<(String, String)>>,
) -> Response {
    let form = FormPairs::from(form);

    let prefs = match parse_preferences(&form) {
        Ok(prefs) => prefs,
        Err(message) => {
            let mut page = RecommendTemplate::form(auth.greeting(), &default_preferences());
            page.error = Some(message);
            return (StatusCode::BAD_REQUEST, page).into_response();
        }
    };

    let mut page = RecommendTemplate::form(auth.greeting(), &prefs);
    page.submitted = true;

    if let Some(rec) = scoring::recommend(state.fixtures().catalog(), &prefs) {
        tracing::debug!(
            primary = %rec.primary.entry.slug,
            percentage = rec.primary.score.percentage(),
            "Legacy recommendation"
        );
        page.primary = Some(MatchView::from(&rec.primary));
        page.alternatives = rec.alternatives.iter().map(MatchView::from).collect();
    }

    page.into_response()
}
