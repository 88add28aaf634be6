//! Raw URL-encoded form access.
//!
//! Quiz and component forms repeat keys (multi-selects, parallel option and
//! label lists), which a flat `Deserialize` struct cannot express.

use axum::Form;

/// Ordered key/value pairs from a submitted form.
#[derive(Debug, Clone, Default)]
pub struct FormPairs(pub Vec<(String, String)>);

impl FormPairs {
    /// First value submitted under `key`.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted under `key`, in submission order.
    #[must_use]
    pub fn all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Parse the first value under `key`.
    #[must_use]
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.first(key).and_then(|v| v.trim().parse().ok())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }
}

impl From<Form<Vec<(String, String)>>> for FormPairs {
    fn from(Form(pairs): Form<Vec<(String, String)>>) -> Self {
        Self(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> FormPairs {
        FormPairs(vec![
            ("name".to_string(), "q-3".to_string()),
            ("q-3".to_string(), "7".to_string()),
            ("q-3".to_string(), "9".to_string()),
            ("budget".to_string(), " 250 ".to_string()),
        ])
    }

    #[test]
    fn test_first_and_all() {
        let form = pairs();
        assert_eq!(form.first("name"), Some("q-3"));
        assert_eq!(form.all("q-3"), vec!["7", "9"]);
        assert!(form.all("missing").is_empty());
    }

    #[test]
    fn test_parse_trims() {
        let form = pairs();
        assert_eq!(form.parse::<f64>("budget"), Some(250.0));
        assert_eq!(form.parse::<u8>("name"), None);
    }
}
