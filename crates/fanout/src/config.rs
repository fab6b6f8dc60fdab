//! Harness configuration: defaults plus environment overrides.
//!
//! | Variable | Values | Default |
//! |---|---|---|
//! | `FANOUT_SPLIT_MODE` | `combined`, `per-relation` | `per-relation` |
//! | `FANOUT_STORE` | store name | `InMemorySample` |
//! | `FANOUT_DIAGNOSTICS` | truthy / falsy | on |
//!
//! Console output mode is detected separately, see [`OutputMode::detect`].

use fanout_console::OutputMode;
use fanout_console::mode::{is_falsy, is_truthy};
use fanout_core::{Error, Result};
use fanout_query::SplitMode;

pub const DEFAULT_STORE: &str = "InMemorySample";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub split_mode: SplitMode,
    pub store: String,
    /// Replay and print every statement of the query.
    pub diagnostics: bool,
    pub output: OutputMode,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            split_mode: SplitMode::default(),
            store: DEFAULT_STORE.to_string(),
            diagnostics: true,
            output: OutputMode::default(),
        }
    }
}

impl HarnessConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.output = OutputMode::detect();
        Ok(config)
    }

    /// Apply overrides from `lookup`. The output mode is left at its default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(mode) = lookup("FANOUT_SPLIT_MODE") {
            config.split_mode = mode
                .parse()
                .map_err(|_| Error::config("FANOUT_SPLIT_MODE", format!(
                    "expected 'combined' or 'per-relation', got '{mode}'"
                )))?;
        }

        if let Some(store) = lookup("FANOUT_STORE") {
            let store = store.trim();
            if store.is_empty() || store.contains(char::is_control) {
                return Err(Error::config(
                    "FANOUT_STORE",
                    format!("'{store}' is not a usable store name"),
                ));
            }
            config.store = store.to_string();
        }

        if let Some(flag) = lookup("FANOUT_DIAGNOSTICS") {
            config.diagnostics = if is_truthy(&flag) {
                true
            } else if is_falsy(&flag) {
                false
            } else {
                return Err(Error::config(
                    "FANOUT_DIAGNOSTICS",
                    format!("expected a boolean, got '{flag}'"),
                ));
            };
        }

        Ok(config)
    }

    pub fn split_mode(mut self, mode: SplitMode) -> Self {
        self.split_mode = mode;
        self
    }

    pub fn store(mut self, name: impl Into<String>) -> Self {
        self.store = name.into();
        self
    }

    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn output(mut self, mode: OutputMode) -> Self {
        self.output = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = HarnessConfig::from_lookup(env_of(&[])).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.split_mode, SplitMode::PerRelation);
        assert_eq!(config.store, "InMemorySample");
        assert!(config.diagnostics);
    }

    #[test]
    fn overrides_apply() {
        let config = HarnessConfig::from_lookup(env_of(&[
            ("FANOUT_SPLIT_MODE", "combined"),
            ("FANOUT_STORE", "Other"),
            ("FANOUT_DIAGNOSTICS", "off"),
        ]))
        .unwrap();
        assert_eq!(config.split_mode, SplitMode::Combined);
        assert_eq!(config.store, "Other");
        assert!(!config.diagnostics);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for vars in [
            [("FANOUT_SPLIT_MODE", "sideways")],
            [("FANOUT_STORE", "  ")],
            [("FANOUT_DIAGNOSTICS", "maybe")],
        ] {
            let err = HarnessConfig::from_lookup(env_of(&vars)).unwrap_err();
            match err {
                Error::Config(e) => assert_eq!(e.key.as_deref(), Some(vars[0].0)),
                other => panic!("expected config error, got {other:?}"),
            }
        }
    }

    #[test]
    fn uri_characters_in_store_names_are_kept() {
        for name in ["%00z", "a?b", "50%", "x/y"] {
            let config =
                HarnessConfig::from_lookup(env_of(&[("FANOUT_STORE", name)])).unwrap();
            assert_eq!(config.store, name);
        }
    }
}
