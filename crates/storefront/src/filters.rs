//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Formats a count compactly: `1234` becomes `1.2k`.
///
/// Usage in templates: `{{ template.likes|compact }}`
#[askama::filter_fn]
pub fn compact(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(compact_count(&value.to_string()))
}

#[allow(clippy::cast_precision_loss)]
fn compact_count(raw: &str) -> String {
    match raw.parse::<u64>() {
        Ok(n) if n >= 1_000_000 => format!("{:.1}m", n as f64 / 1_000_000.0),
        Ok(n) if n >= 1_000 => format!("{:.1}k", n as f64 / 1_000.0),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_count() {
        assert_eq!(compact_count("42"), "42");
        assert_eq!(compact_count("1234"), "1.2k");
        assert_eq!(compact_count("2500000"), "2.5m");
        assert_eq!(compact_count("n/a"), "n/a");
    }
}
