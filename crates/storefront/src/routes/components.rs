//! HTMX control fragments.
//!
//! Controls own no state. Each fragment posts its current value plus the
//! event (toggle, promote, slide) and gets back the re-rendered control.
//! The hidden inputs inside each fragment are what the surrounding form
//! finally submits.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, response::IntoResponse};
use vaporwise_core::controls::{RangeSlider, promote_to_top, toggle_selection};

use crate::error::{AppError, Result};
use crate::routes::form::FormPairs;

// =============================================================================
// View Types
// =============================================================================

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A multi-select rendered as toggle buttons.
#[derive(Debug, Clone)]
pub struct CheckboxGroupView {
    /// Form field the selected values are submitted under.
    pub name: String,
    pub choices: Vec<ChoiceView>,
}

impl CheckboxGroupView {
    /// Build from `(value, label)` options and the selected values.
    #[must_use]
    pub fn new(name: String, options: Vec<(String, String)>, selected: &[String]) -> Self {
        let choices = options
            .into_iter()
            .map(|(value, label)| ChoiceView {
                selected: selected.contains(&value),
                value,
                label,
            })
            .collect();
        Self { name, choices }
    }

    /// Selected values, in option order.
    #[must_use]
    pub fn selected_values(&self) -> Vec<&str> {
        self.choices
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.value.as_str())
            .collect()
    }
}

/// One rankable item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankItemView {
    pub value: String,
    pub label: String,
}

/// An ordered list where clicking an item moves it to the top.
#[derive(Debug, Clone)]
pub struct RankOrderView {
    pub name: String,
    pub items: Vec<RankItemView>,
}

impl RankOrderView {
    /// Comma-separated order, as submitted with the form.
    #[must_use]
    pub fn order(&self) -> String {
        self.items
            .iter()
            .map(|i| i.value.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A numeric slider with its current value.
#[derive(Debug, Clone)]
pub struct RangeSliderView {
    pub name: String,
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub value: f64,
    pub unit: String,
    /// Track fill, `0`-`100`, rounded for the inline width.
    pub fill: u8,
}

impl RangeSliderView {
    /// Build a slider showing `value` snapped onto the track.
    #[must_use]
    pub fn new(
        name: String,
        label: String,
        slider: RangeSlider,
        value: f64,
        unit: Option<String>,
    ) -> Self {
        let value = slider.snap(value);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let fill = slider.fill_percent(value).round().clamp(0.0, 100.0) as u8;
        Self {
            name,
            label,
            min: slider.min,
            max: slider.max,
            step: slider.step,
            value,
            unit: unit.unwrap_or_default(),
            fill,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkbox group fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkbox_group.html")]
pub struct CheckboxGroupTemplate {
    pub group: CheckboxGroupView,
}

/// Rank order fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/rank_order.html")]
pub struct RankOrderTemplate {
    pub rank: RankOrderView,
}

/// Range slider fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/range_slider.html")]
pub struct RangeSliderTemplate {
    pub slider: RangeSliderView,
}

// =============================================================================
// Handlers
// =============================================================================
//
// A fragment is posted with every field of the page form it sits in, so
// several controls can share one request. The triggering control names
// itself in `control`, and each control's own fields are prefixed with
// that name (`{name}.option`, `{name}.min`, ...).

/// The control that fired, guarded against empty input.
fn control_name(form: &FormPairs) -> Result<String> {
    form.first("control")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .ok_or_else(|| AppError::BadRequest("Missing control name".to_string()))
}

fn meta_key(name: &str, field: &str) -> String {
    format!("{name}.{field}")
}

/// Zip the control's parallel `option` and `label` lists.
fn options(form: &FormPairs, name: &str) -> Result<Vec<(String, String)>> {
    let values = form.all(&meta_key(name, "option"));
    let labels = form.all(&meta_key(name, "label"));
    if values.len() != labels.len() {
        return Err(AppError::BadRequest(
            "Every option needs a label".to_string(),
        ));
    }
    Ok(values
        .into_iter()
        .zip(labels)
        .map(|(v, l)| (v.to_string(), l.to_string()))
        .collect())
}

/// Items in the submitted order, with any options the order missed appended.
///
/// Unknown and repeated values in `order` are dropped, so the result always
/// holds every option exactly once.
#[must_use]
pub fn ranked_items(options: Vec<(String, String)>, order: &[&str]) -> Vec<RankItemView> {
    let mut remaining = options;
    let mut items = Vec::with_capacity(remaining.len());

    for value in order {
        if let Some(pos) = remaining.iter().position(|(v, _)| v == value) {
            let (value, label) = remaining.remove(pos);
            items.push(RankItemView { value, label });
        }
    }
    items.extend(
        remaining
            .into_iter()
            .map(|(value, label)| RankItemView { value, label }),
    );
    items
}

/// Toggle one value of a checkbox group.
///
/// Form: `control`, repeated `{control}.option`/`{control}.label`, the
/// selected values under `{control}`, and `toggle`.
pub async fn checkbox_group(form: Form<Vec<(String, String)>>) -> Result<impl IntoResponse> {
    let form = FormPairs::from(form);
    let name = control_name(&form)?;
    let options = options(&form, &name)?;

    let selected: Vec<String> = form.all(&name).into_iter().map(String::from).collect();
    let selected = match form.first("toggle") {
        Some(value) if options.iter().any(|(v, _)| v == value) => {
            toggle_selection(&selected, &value.to_string())
        }
        _ => selected,
    };

    Ok(CheckboxGroupTemplate {
        group: CheckboxGroupView::new(name, options, &selected),
    })
}

/// Promote one item of a rank-order list to the top.
///
/// Form: `control`, repeated `{control}.option`/`{control}.label`, the
/// current order under `{control}` (comma-separated), and `promote`.
pub async fn rank_order(form: Form<Vec<(String, String)>>) -> Result<impl IntoResponse> {
    let form = FormPairs::from(form);
    let name = control_name(&form)?;
    let options = options(&form, &name)?;

    let order: Vec<&str> = form
        .first(&name)
        .map(|s| s.split(',').map(str::trim).collect())
        .unwrap_or_default();
    let mut items = ranked_items(options, &order);

    if let Some(target) = form
        .first("promote")
        .and_then(|id| items.iter().find(|i| i.value == id).cloned())
    {
        items = promote_to_top(&items, &target);
    }

    Ok(RankOrderTemplate {
        rank: RankOrderView { name, items },
    })
}

/// Clamp and snap a slider value.
///
/// Form: `control`, `{control}.min`/`.max`/`.step`, optional
/// `{control}.label` and `{control}.unit`, and the value under `{control}`.
pub async fn range_slider(form: Form<Vec<(String, String)>>) -> Result<impl IntoResponse> {
    let form = FormPairs::from(form);
    let name = control_name(&form)?;

    let slider = match (
        form.parse(&meta_key(&name, "min")),
        form.parse(&meta_key(&name, "max")),
        form.parse(&meta_key(&name, "step")),
    ) {
        (Some(min), Some(max), Some(step)) => RangeSlider::new(min, max, step),
        _ => None,
    }
    .ok_or_else(|| AppError::BadRequest("Invalid slider bounds".to_string()))?;

    let value = form.parse(&name).unwrap_or(slider.min);
    let label = form
        .first(&meta_key(&name, "label"))
        .unwrap_or_default()
        .to_string();
    let unit = form
        .first(&meta_key(&name, "unit"))
        .map(String::from)
        .filter(|u| !u.is_empty());

    Ok(RangeSliderTemplate {
        slider: RangeSliderView::new(name, label, slider, value, unit),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn opts() -> Vec<(String, String)> {
        vec![
            ("a".to_string(), "Flavor".to_string()),
            ("b".to_string(), "Clouds".to_string()),
            ("c".to_string(), "Battery".to_string()),
        ]
    }

    #[test]
    fn test_checkbox_group_marks_selected() {
        let group = CheckboxGroupView::new("q-1".to_string(), opts(), &["c".to_string()]);
        assert_eq!(group.selected_values(), vec!["c"]);
        assert!(!group.choices[0].selected);
    }

    #[test]
    fn test_rank_order_joins_values() {
        let rank = RankOrderView {
            name: "q-2".to_string(),
            items: opts()
                .into_iter()
                .map(|(value, label)| RankItemView { value, label })
                .collect(),
        };
        assert_eq!(rank.order(), "a,b,c");
    }

    #[test]
    fn test_ranked_items_completes_partial_order() {
        let items = ranked_items(opts(), &["c"]);
        let values: Vec<&str> = items.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_ranked_items_drops_repeats_and_unknowns() {
        let items = ranked_items(opts(), &["b", "b", "zz", "a"]);
        let values: Vec<&str> = items.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_options_reads_only_the_named_control() {
        let form = FormPairs(vec![
            ("budget.label".to_string(), "Budget".to_string()),
            ("q-3.option".to_string(), "a".to_string()),
            ("q-3.label".to_string(), "Flavor".to_string()),
            ("q-4.option".to_string(), "x".to_string()),
            ("q-4.label".to_string(), "Other".to_string()),
        ]);
        assert_eq!(
            options(&form, "q-3").unwrap(),
            vec![("a".to_string(), "Flavor".to_string())]
        );
    }

    #[test]
    fn test_range_slider_snaps_and_fills() {
        let slider = RangeSlider::new(0.0, 500.0, 25.0).unwrap();
        let view = RangeSliderView::new(
            "budget".to_string(),
            "Budget".to_string(),
            slider,
            262.0,
            Some("$".to_string()),
        );
        assert!((view.value - 250.0).abs() < f64::EPSILON);
        assert_eq!(view.fill, 50);

        let view = RangeSliderView::new("b".to_string(), String::new(), slider, 9000.0, None);
        assert!((view.value - 500.0).abs() < f64::EPSILON);
        assert_eq!(view.fill, 100);
    }
}
