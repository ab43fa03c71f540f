//! Navigator configuration.
//!
//! ```toml
//! ignored_keys = ["seed"]
//! max_label_chars = 40
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Recognized navigator options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavigatorConfig {
    /// Keys removed from the schema and, when non-empty, projected away.
    #[serde(default, alias = "ignoredKeys")]
    pub ignored_keys: BTreeSet<String>,

    /// Display truncation hint for labels. The engine never truncates.
    #[serde(default, alias = "maxLabelChars")]
    pub max_label_chars: Option<usize>,
}

/// How the substrate is derived from the job set, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Navigate raw jobs.
    NoShadow,
    /// Navigate reduced parameter maps with these keys removed.
    Shadow(BTreeSet<String>),
}

impl NavigatorConfig {
    pub fn with_ignored_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn with_max_label_chars(mut self, max: Option<usize>) -> Self {
        self.max_label_chars = max;
        self
    }

    pub fn projection(&self) -> ProjectionMode {
        if self.ignored_keys.is_empty() {
            ProjectionMode::NoShadow
        } else {
            ProjectionMode::Shadow(self.ignored_keys.clone())
        }
    }

    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_means_no_shadow() {
        let config = NavigatorConfig::from_toml_str("", "inline").expect("empty parses");
        assert_eq!(config, NavigatorConfig::default());
        assert_eq!(config.projection(), ProjectionMode::NoShadow);
    }

    #[test]
    fn ignored_keys_select_shadow_mode() {
        let config = NavigatorConfig::from_toml_str(
            "ignored_keys = [\"seed\", \"replica\"]\nmax_label_chars = 12\n",
            "inline",
        )
        .expect("parses");
        assert_eq!(config.max_label_chars, Some(12));
        assert_eq!(
            config.projection(),
            ProjectionMode::Shadow(BTreeSet::from(["replica".to_string(), "seed".to_string()]))
        );
    }

    #[test]
    fn camel_case_aliases_are_accepted() {
        let config = NavigatorConfig::from_toml_str("ignoredKeys = [\"seed\"]", "inline")
            .expect("alias parses");
        assert!(config.ignored_keys.contains("seed"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = NavigatorConfig::from_toml_str("ignore = \"seed\"", "gridnav.toml")
            .expect_err("unknown key");
        assert!(err.to_string().starts_with("failed to parse gridnav.toml"));
    }

    #[test]
    fn builder_merges_ignored_keys() {
        let config = NavigatorConfig::default()
            .with_ignored_keys(["seed"])
            .with_ignored_keys(vec!["replica".to_string()])
            .with_max_label_chars(Some(8));
        assert_eq!(config.ignored_keys.len(), 2);
        assert_eq!(config.max_label_chars, Some(8));
    }
}
