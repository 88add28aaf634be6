//! State transitions behind the interactive form controls.
//!
//! Controls never own state. The page submits the current value together
//! with an event and renders whatever these functions return.

/// Toggle `value` in a multi-select.
///
/// Removes exactly `value` if present (keeping the order of the rest),
/// otherwise appends it.
#[must_use]
pub fn toggle_selection<T: PartialEq + Clone>(selected: &[T], value: &T) -> Vec<T> {
    if selected.contains(value) {
        selected.iter().filter(|v| *v != value).cloned().collect()
    } else {
        let mut next = selected.to_vec();
        next.push(value.clone());
        next
    }
}

/// Move `id` to the front of a ranking, keeping the relative order of the
/// other items. Unknown ids leave the order unchanged.
#[must_use]
pub fn promote_to_top<T: PartialEq + Clone>(order: &[T], id: &T) -> Vec<T> {
    let Some(pos) = order.iter().position(|v| v == id) else {
        return order.to_vec();
    };
    let mut next = order.to_vec();
    let item = next.remove(pos);
    next.insert(0, item);
    next
}

/// Slack for float error when counting steps.
const GRID_TOLERANCE: f64 = 1e-9;

/// Numeric slider bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSlider {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl RangeSlider {
    /// Build a slider, returning `None` for an empty range or non-positive step.
    #[must_use]
    pub fn new(min: f64, max: f64, step: f64) -> Option<Self> {
        let valid = min.is_finite() && max.is_finite() && min < max && step.is_finite() && step > 0.0;
        valid.then_some(Self { min, max, step })
    }

    /// Clamp to the bounds. Non-finite input falls back to `min`.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Clamp, then round to the nearest step counted from `min`.
    ///
    /// The result is always a grid point: when `max` is not reachable in
    /// whole steps the highest value is the last step below it.
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        let clamped = self.clamp(value);
        let steps = ((clamped - self.min) / self.step).round();
        self.min + steps.min(self.last_step()) * self.step
    }

    /// Number of whole steps between `min` and `max`.
    fn last_step(&self) -> f64 {
        ((self.max - self.min) / self.step + GRID_TOLERANCE).floor()
    }

    /// Position of `value` as a 0-100 percentage of the track.
    #[must_use]
    pub fn fill_percent(&self, value: f64) -> f64 {
        (self.clamp(value) - self.min) / (self.max - self.min) * 100.0
    }
}

/// Page window over a list of `total_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    per_page: usize,
    total_items: usize,
}

impl Pagination {
    /// Requested pages outside `1..=total_pages` are clamped. An empty list
    /// has one (empty) page.
    #[must_use]
    pub fn new(total_items: usize, per_page: usize, requested_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_items.div_ceil(per_page).max(1);
        Self {
            page: requested_page.clamp(1, total_pages),
            per_page,
            total_items,
        }
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn per_page(&self) -> usize {
        self.per_page
    }

    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.total_items
    }

    #[must_use]
    pub const fn total_pages(&self) -> usize {
        let pages = self.total_items.div_ceil(self.per_page);
        if pages == 0 { 1 } else { pages }
    }

    /// Index of the first item on the current page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_toggle_removes_exactly_the_value() {
        let selected = strings(&["flavor", "clouds", "battery"]);
        let next = toggle_selection(&selected, &"clouds".to_string());
        assert_eq!(next, strings(&["flavor", "battery"]));
    }

    #[test]
    fn test_toggle_appends_new_value() {
        let selected = strings(&["flavor"]);
        let next = toggle_selection(&selected, &"clouds".to_string());
        assert_eq!(next, strings(&["flavor", "clouds"]));
        assert_eq!(toggle_selection(&next, &"clouds".to_string()), selected);
    }

    #[test]
    fn test_promote_to_top() {
        let order = strings(&["a", "b", "c"]);
        assert_eq!(
            promote_to_top(&order, &"b".to_string()),
            strings(&["b", "a", "c"])
        );
        assert_eq!(
            promote_to_top(&order, &"c".to_string()),
            strings(&["c", "a", "b"])
        );
        assert_eq!(promote_to_top(&order, &"a".to_string()), order);
    }

    #[test]
    fn test_promote_unknown_is_noop() {
        let order = strings(&["a", "b"]);
        assert_eq!(promote_to_top(&order, &"z".to_string()), order);
    }

    #[test]
    fn test_slider_clamp_and_snap() {
        let slider = RangeSlider::new(50.0, 500.0, 25.0).unwrap();
        assert_eq!(slider.clamp(10.0), 50.0);
        assert_eq!(slider.clamp(900.0), 500.0);
        assert_eq!(slider.clamp(f64::NAN), 50.0);
        assert_eq!(slider.snap(262.0), 250.0);
        assert_eq!(slider.snap(263.0), 275.0);
        assert_eq!(slider.snap(1_000.0), 500.0);
        assert_eq!(slider.fill_percent(275.0), 50.0);
    }

    #[test]
    fn test_slider_snap_stays_on_grid_below_uneven_max() {
        // 0..=10 in steps of 3 reaches 9, not 10.
        let slider = RangeSlider::new(0.0, 10.0, 3.0).unwrap();
        assert_eq!(slider.snap(10.0), 9.0);
        assert_eq!(slider.snap(100.0), 9.0);
        assert_eq!(slider.snap(4.0), 3.0);

        let slider = RangeSlider::new(0.0, 1.0, 0.1).unwrap();
        assert!((slider.snap(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_slider_rejects_bad_bounds() {
        assert!(RangeSlider::new(10.0, 10.0, 1.0).is_none());
        assert!(RangeSlider::new(0.0, 10.0, 0.0).is_none());
    }

    #[test]
    fn test_pagination_clamps_page() {
        let p = Pagination::new(20, 9, 0);
        assert_eq!(p.page(), 1);
        assert_eq!(p.total_pages(), 3);
        assert!(!p.has_previous());
        assert!(p.has_next());

        let p = Pagination::new(20, 9, 7);
        assert_eq!(p.page(), 3);
        assert_eq!(p.offset(), 18);
        assert!(p.has_previous());
        assert!(!p.has_next());
    }

    #[test]
    fn test_pagination_empty_list() {
        let p = Pagination::new(0, 9, 4);
        assert_eq!(p.page(), 1);
        assert_eq!(p.total_pages(), 1);
        assert_eq!(p.offset(), 0);
        assert!(!p.has_next());
    }
}
