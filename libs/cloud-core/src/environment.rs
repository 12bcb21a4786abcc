//! Configuration source for providers
//!
//! Providers never call `std::env::var` directly; they read through an
//! [`Environment`] so a host can scope settings under a prefix and tests can
//! supply values without touching the process environment.

use std::collections::HashMap;
use std::str::FromStr;

use crate::ConfigError;

/// Normalize a setting name to its environment variable form.
///
/// ASCII letters are upper-cased, digits are kept and everything else
/// becomes `_`, so `prefix` reads `PREFIX` and `my-key.name` reads
/// `MY_KEY_NAME`.
pub fn normalize_env_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Source {
    Process,
    Map(HashMap<String, String>),
}

/// Named settings, optionally scoped under a segment prefix
#[derive(Debug, Clone)]
pub struct Environment {
    source: Source,
    prefix: Option<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::from_process()
    }
}

impl Environment {
    /// Read settings from the process environment
    pub fn from_process() -> Self {
        Self {
            source: Source::Process,
            prefix: None,
        }
    }

    /// Read settings from a fixed set of values (the process environment is ignored)
    pub fn from_map<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (normalize_env_name(k.as_ref()), v.into()))
            .collect();

        Self {
            source: Source::Map(values),
            prefix: None,
        }
    }

    /// Scope lookups under `prefix`: `get("project")` tries `PREFIX_PROJECT`
    /// before `PROJECT`.
    pub fn with_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        let prefix = normalize_env_name(prefix.as_ref());
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    fn lookup(&self, name: &str) -> Option<String> {
        let value = match &self.source {
            Source::Process => std::env::var(name).ok(),
            Source::Map(values) => values.get(name).cloned(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Get a setting, `None` if absent or empty
    pub fn get(&self, name: &str) -> Option<String> {
        let name = normalize_env_name(name);

        if let Some(ref prefix) = self.prefix {
            if let Some(value) = self.lookup(&format!("{prefix}_{name}")) {
                return Some(value);
            }
        }

        self.lookup(&name)
    }

    /// Get a setting that must be present
    pub fn force(&self, name: &str) -> Result<String, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::Missing(normalize_env_name(name)))
    }

    /// Get a setting or fall back to `default`
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// Get and parse a setting, `Ok(None)` if absent
    pub fn get_parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::Invalid {
                    name: normalize_env_name(name),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Get a boolean flag (`true`/`false`, case-insensitive)
    pub fn get_flag(&self, name: &str, default: bool) -> bool {
        self.get(name)
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(default)
    }
}
