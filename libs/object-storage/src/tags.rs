//! Tag sanitization for bucket labels and object metadata

use std::collections::HashMap;

use tracing::warn;

fn is_valid_label(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c == '-' || c == '_')
}

/// Lower-case every tag and keep only pairs whose key and value are made
/// of `[a-z_-]`. Dropped pairs are logged.
pub fn prepare_tags(tags: &HashMap<String, String>) -> HashMap<String, String> {
    let mut prepared = HashMap::with_capacity(tags.len());

    for (key, value) in tags {
        let key = key.to_lowercase();
        let value = value.to_lowercase();

        if is_valid_label(&key) && is_valid_label(&value) {
            prepared.insert(key, value);
        } else {
            warn!(key = %key, value = %value, "Invalid label found, skipping");
        }
    }

    prepared
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_tags_are_lowercased() {
        let prepared = prepare_tags(&tags(&[("Team", "Data-Eng")]));

        assert_eq!(prepared, tags(&[("team", "data-eng")]));
    }

    #[test]
    fn test_invalid_tags_are_dropped() {
        let prepared = prepare_tags(&tags(&[
            ("env", "prod"),
            ("version", "v2"),
            ("cost center", "ops"),
            ("owner", "a.b@example.com"),
        ]));

        assert_eq!(prepared, tags(&[("env", "prod")]));
    }

    #[test]
    fn test_empty_values_are_allowed() {
        let prepared = prepare_tags(&tags(&[("flag", ""), ("under_score", "x_y")]));

        assert_eq!(prepared, tags(&[("flag", ""), ("under_score", "x_y")]));
    }
}
