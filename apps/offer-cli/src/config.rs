//! # Desk Configuration
//!
//! Configuration for the `offer-desk` binary.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line flags (highest priority, applied in main.rs)          │
//! │     --double-stackable --max-iterations 5                              │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     OFFER_DOUBLE_STACKABLE=true                                        │
//! │     OFFER_MAX_ITERATIONS=5                                             │
//! │     OFFER_ARTICLE_STATE=/srv/offers/article_number.json                │
//! │     OFFER_ARTICLE_PREFIX=AC                                            │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/offer-desk/offer-desk.toml (Linux)                       │
//! │     ~/Library/Application Support/com.offerdesk.offer-desk/ (macOS)    │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # offer-desk.toml
//! [completion]
//! double_stackable = false
//! max_iterations = 3
//!
//! [article_number]
//! prefix = "AC"
//! width = 8
//! start_next = 1000
//! state_path = "data/article_number.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use offer_core::article::{validate_article_config, ArticleNumberConfig, DEFAULT_PREFIX, DEFAULT_START_NEXT, DEFAULT_WIDTH};
use offer_core::validation::validate_iteration_cap;
use offer_core::{CompletionOptions, DEFAULT_MAX_ITERATIONS};
use offer_store::DEFAULT_STATE_PATH;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Completion Settings
// =============================================================================

/// Settings for the completion engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSettings {
    /// Double availability counts for double-stackable goods.
    #[serde(default)]
    pub double_stackable: bool,

    /// Iteration cap. Signed so that a negative value in the file is
    /// reported as out of range.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: i64,
}

fn default_max_iterations() -> i64 {
    DEFAULT_MAX_ITERATIONS as i64
}

impl Default for CompletionSettings {
    fn default() -> Self {
        CompletionSettings {
            double_stackable: false,
            max_iterations: default_max_iterations(),
        }
    }
}

// =============================================================================
// Article Number Settings
// =============================================================================

/// Settings for article number allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleNumberSettings {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_width")]
    pub width: usize,

    #[serde(default = "default_start_next")]
    pub start_next: u64,

    /// Counter state file. Relative paths resolve against the working
    /// directory.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_width() -> usize {
    DEFAULT_WIDTH
}

fn default_start_next() -> u64 {
    DEFAULT_START_NEXT
}

fn default_state_path() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_PATH)
}

impl Default for ArticleNumberSettings {
    fn default() -> Self {
        ArticleNumberSettings {
            prefix: default_prefix(),
            width: default_width(),
            start_next: default_start_next(),
            state_path: default_state_path(),
        }
    }
}

impl ArticleNumberSettings {
    /// Formatting part of the settings.
    pub fn format_config(&self) -> ArticleNumberConfig {
        ArticleNumberConfig {
            prefix: self.prefix.clone(),
            width: self.width,
            start_next: self.start_next,
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration for `offer-desk`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub completion: CompletionSettings,

    #[serde(default)]
    pub article_number: ArticleNumberSettings,
}

impl DeskConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Loading Order
    /// 1. Start with defaults
    /// 2. Load from config file (if it exists)
    /// 3. Apply environment variable overrides
    /// 4. Validate the result
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &std::path::Path) -> ConfigResult<()> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(io_err)?;

        info!(?path, "Saved config");
        Ok(())
    }

    /// Writes a default config file for `offer-desk config init`.
    ///
    /// An existing file is only replaced when `force` is set.
    pub fn write_default(path: &std::path::Path, force: bool) -> ConfigResult<Self> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }

        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_iteration_cap(self.completion.max_iterations)?;
        validate_article_config(&self.article_number.format_config())?;
        Ok(())
    }

    /// Engine options from the completion settings.
    pub fn completion_options(&self) -> ConfigResult<CompletionOptions> {
        let max_iterations = validate_iteration_cap(self.completion.max_iterations)?;
        Ok(CompletionOptions::new(self.completion.double_stackable).max_iterations(max_iterations))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `OFFER_*` overrides from any key/value source.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("OFFER_DOUBLE_STACKABLE") {
            match parse_bool(&value) {
                Some(flag) => {
                    debug!(double_stackable = flag, "Overriding double-stackable from environment");
                    self.completion.double_stackable = flag;
                }
                None => warn!(value = %value, "Unknown OFFER_DOUBLE_STACKABLE value"),
            }
        }

        if let Some(value) = lookup("OFFER_MAX_ITERATIONS") {
            match value.trim().parse::<i64>() {
                Ok(max) => {
                    debug!(max_iterations = max, "Overriding iteration cap from environment");
                    self.completion.max_iterations = max;
                }
                Err(_) => warn!(value = %value, "OFFER_MAX_ITERATIONS is not an integer"),
            }
        }

        if let Some(path) = lookup("OFFER_ARTICLE_STATE") {
            debug!(path = %path, "Overriding article state path from environment");
            self.article_number.state_path = PathBuf::from(path);
        }

        if let Some(prefix) = lookup("OFFER_ARTICLE_PREFIX") {
            self.article_number.prefix = prefix;
        }
    }

    /// Returns the default config file path.
    ///
    /// ## Platform Paths
    /// - Linux: `~/.config/offer-desk/offer-desk.toml`
    /// - macOS: `~/Library/Application Support/com.offerdesk.offer-desk/offer-desk.toml`
    /// - Windows: `C:\Users\<User>\AppData\Roaming\offerdesk\offer-desk\config\offer-desk.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "offerdesk", "offer-desk")
            .map(|dirs| dirs.config_dir().join("offer-desk.toml"))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = DeskConfig::default();
        assert!(!config.completion.double_stackable);
        assert_eq!(config.completion.max_iterations, 3);
        assert_eq!(config.article_number.prefix, "AC");
        assert_eq!(config.article_number.state_path, PathBuf::from("data/article_number.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: DeskConfig = toml::from_str(
            r#"
            [completion]
            double_stackable = true
            "#,
        )
        .unwrap();
        assert!(config.completion.double_stackable);
        assert_eq!(config.completion.max_iterations, 3);
        assert_eq!(config.article_number.width, 8);
    }

    #[test]
    fn test_config_validation() {
        let mut config = DeskConfig::default();
        config.completion.max_iterations = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.completion.max_iterations = -4;
        assert!(config.validate().is_err());

        let mut config = DeskConfig::default();
        config.article_number.prefix = "A-C".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DeskConfig::default();
        config.apply_overrides(env(&[
            ("OFFER_DOUBLE_STACKABLE", "yes"),
            ("OFFER_MAX_ITERATIONS", "5"),
            ("OFFER_ARTICLE_STATE", "/srv/offers/counter.json"),
            ("OFFER_ARTICLE_PREFIX", "OF"),
        ]));

        assert!(config.completion.double_stackable);
        assert_eq!(config.completion.max_iterations, 5);
        assert_eq!(config.article_number.state_path, PathBuf::from("/srv/offers/counter.json"));
        assert_eq!(config.article_number.prefix, "OF");
    }

    #[test]
    fn test_unparseable_env_values_are_ignored() {
        let mut config = DeskConfig::default();
        config.apply_overrides(env(&[
            ("OFFER_DOUBLE_STACKABLE", "maybe"),
            ("OFFER_MAX_ITERATIONS", "lots"),
        ]));
        assert_eq!(config, DeskConfig::default());
    }

    #[test]
    fn test_completion_options() {
        let mut config = DeskConfig::default();
        config.completion.double_stackable = true;
        config.completion.max_iterations = 4;

        let options = config.completion_options().unwrap();
        assert!(options.double_stackable);
        assert_eq!(options.max_iterations, 4);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("offer-desk.toml");

        let mut config = DeskConfig::default();
        config.completion.max_iterations = 6;
        config.article_number.start_next = 5000;
        config.save(&path).unwrap();

        let loaded: DeskConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_write_default_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offer-desk.toml");

        let written = DeskConfig::write_default(&path, false).unwrap();
        assert_eq!(written, DeskConfig::default());
        assert_eq!(DeskConfig::load(Some(path.clone())).unwrap().article_number.width, 8);

        std::fs::write(&path, "[completion]\nmax_iterations = 7\n").unwrap();
        assert!(matches!(
            DeskConfig::write_default(&path, false),
            Err(ConfigError::AlreadyExists { .. })
        ));
        assert!(std::fs::read_to_string(&path).unwrap().contains("max_iterations = 7"));

        DeskConfig::write_default(&path, true).unwrap();
        let loaded: DeskConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, DeskConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offer-desk.toml");
        std::fs::write(&path, "[completion\nmax_iterations = 3").unwrap();
        assert!(matches!(DeskConfig::load(Some(path)), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("sometimes"), None);
    }
}
