//! Configuration management for the wikitext serializer.
//!
//! Parses `wt.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Example
//!
//! ```toml
//! [serializer]
//! max_newlines = 2
//! max_newlines_in_table = 1
//! selective = true
//! unknown_elements = "strict"
//!
//! [output]
//! trailing_newline = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override selective serialization.
    pub selective: Option<bool>,
    /// Override the unknown-element policy.
    pub unknown_elements: Option<UnknownElementPolicy>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wt.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serializer configuration.
    pub serializer: SerializerConfig,
    /// Output configuration.
    pub output: OutputConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// What to do with an element that has no handler and no source span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownElementPolicy {
    /// Abort the pass.
    #[default]
    Strict,
    /// Drop the wrapper, serialize its children and record a lossy note.
    Unwrap,
}

/// Serializer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Largest newline run allowed between top-level blocks.
    pub max_newlines: u32,
    /// Largest newline run allowed inside wikitext table syntax.
    pub max_newlines_in_table: u32,
    /// Reuse original source for unmodified content.
    pub selective: bool,
    /// Policy for unknown elements without a source span.
    pub unknown_elements: UnknownElementPolicy,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            max_newlines: 2,
            max_newlines_in_table: 1,
            selective: true,
            unknown_elements: UnknownElementPolicy::Strict,
        }
    }
}

impl SerializerConfig {
    /// Validate newline limits.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a limit is zero or the table limit
    /// exceeds the top-level limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive(self.max_newlines, "serializer.max_newlines")?;
        require_positive(self.max_newlines_in_table, "serializer.max_newlines_in_table")?;
        if self.max_newlines_in_table > self.max_newlines {
            return Err(ConfigError::Validation(format!(
                "serializer.max_newlines_in_table ({}) cannot exceed serializer.max_newlines ({})",
                self.max_newlines_in_table, self.max_newlines
            )));
        }
        Ok(())
    }
}

/// Output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Append a final newline when the text does not end with one.
    pub trailing_newline: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a numeric field to be greater than zero.
fn require_positive(value: u32, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wt.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(selective) = settings.selective {
            self.serializer.selective = selective;
        }
        if let Some(policy) = settings.unknown_elements {
            self.serializer.unknown_elements = policy;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        discover_from(&std::env::current_dir().ok()?)
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.serializer.validate()
    }
}

/// Search `start` and its parents for a config file.
fn discover_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serializer.max_newlines, 2);
        assert_eq!(config.serializer.max_newlines_in_table, 1);
        assert!(config.serializer.selective);
        assert_eq!(
            config.serializer.unknown_elements,
            UnknownElementPolicy::Strict
        );
        assert!(!config.output.trailing_newline);
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.serializer, SerializerConfig::default());
    }

    #[test]
    fn test_parse_serializer_config() {
        let toml = r#"
[serializer]
max_newlines = 3
max_newlines_in_table = 2
selective = false
unknown_elements = "unwrap"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.serializer.max_newlines, 3);
        assert_eq!(config.serializer.max_newlines_in_table, 2);
        assert!(!config.serializer.selective);
        assert_eq!(
            config.serializer.unknown_elements,
            UnknownElementPolicy::Unwrap
        );
    }

    #[test]
    fn test_parse_output_config() {
        let toml = r"
[output]
trailing_newline = true
";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.output.trailing_newline);
    }

    #[test]
    fn test_parse_invalid_policy() {
        let toml = r#"
[serializer]
unknown_elements = "ignore"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_max_newlines_zero() {
        let config = SerializerConfig {
            max_newlines: 0,
            ..SerializerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("serializer.max_newlines"));
    }

    #[test]
    fn test_validate_table_limit_zero() {
        let config = SerializerConfig {
            max_newlines_in_table: 0,
            ..SerializerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_table_limit_above_top_level() {
        let config = SerializerConfig {
            max_newlines: 2,
            max_newlines_in_table: 3,
            ..SerializerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cannot exceed"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        let overrides = CliSettings {
            selective: Some(false),
            unknown_elements: Some(UnknownElementPolicy::Unwrap),
        };

        config.apply_cli_settings(&overrides);

        assert!(!config.serializer.selective);
        assert_eq!(
            config.serializer.unknown_elements,
            UnknownElementPolicy::Unwrap
        );
        assert_eq!(config.serializer.max_newlines, 2); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.serializer, SerializerConfig::default());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[serializer]\nselective = false\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert!(!config.serializer.selective);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_cli_settings_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[serializer]\nselective = false\n").unwrap();
        let overrides = CliSettings {
            selective: Some(true),
            ..Default::default()
        };

        let config = Config::load(Some(&path), Some(&overrides)).unwrap();

        assert!(config.serializer.selective);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn test_load_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[serializer]\nmax_newlines_in_table = 5\n").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[serializer\n").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        let found = discover_from(&nested).unwrap();

        assert_eq!(found, dir.path().join(CONFIG_FILENAME));
    }

    #[test]
    fn test_discover_prefers_nearest() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();
        std::fs::write(nested.join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(discover_from(&nested), Some(nested.join(CONFIG_FILENAME)));
    }
}
