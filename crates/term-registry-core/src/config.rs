//! Configuration types for the terminal session registry.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Dimensions, Error, ShellType};

/// Registry configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// User preferences handed to new sessions
    pub preferences: PreferenceSettings,
    /// Defaults for freshly created terminals
    pub terminal: TerminalSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl RegistryConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: RegistryConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.terminal.dimensions().is_valid() {
            return Err(Error::Config("terminal dimensions must be > 0".to_string()));
        }

        if self.logging.log_level.trim().is_empty() {
            return Err(Error::Config("logging.log_level cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// User preferences consulted when sessions are created or started.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceSettings {
    /// New sessions persist environment variables across reconnects
    pub track_environment: bool,
    /// Sessions render a blinking cursor
    pub blinking_cursor: bool,
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        Self {
            track_environment: true,
            blinking_cursor: true,
        }
    }
}

/// Defaults applied to freshly created terminals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    /// Default terminal rows
    pub default_rows: u16,
    /// Default terminal columns
    pub default_cols: u16,
    /// Shell kind for new sessions
    pub default_shell: ShellType,
}

impl TerminalSettings {
    /// Default dimensions as a [`Dimensions`] value.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.default_rows, self.default_cols)
    }
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            default_rows: 24,
            default_cols: 80,
            default_shell: ShellType::Default,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert!(config.preferences.track_environment);
        assert!(config.preferences.blinking_cursor);
        assert_eq!(config.terminal.default_rows, 24);
        assert_eq!(config.terminal.default_cols, 80);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_config_validation() {
        let config = RegistryConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_dimensions() {
        let mut config = RegistryConfig::default();
        config.terminal.default_cols = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_log_level() {
        let mut config = RegistryConfig::default();
        config.logging.log_level = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
preferences:
  track_environment: false
  blinking_cursor: false

terminal:
  default_rows: 30
  default_cols: 120
  default_shell: posix_zsh

logging:
  log_level: debug
"#;

        let config = RegistryConfig::from_yaml(yaml).unwrap();
        assert!(!config.preferences.track_environment);
        assert!(!config.preferences.blinking_cursor);
        assert_eq!(config.terminal.dimensions(), Dimensions::new(30, 120));
        assert_eq!(config.terminal.default_shell, ShellType::PosixZsh);
        assert_eq!(config.logging.log_level, "debug");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
preferences:
  blinking_cursor: false
"#;

        let config = RegistryConfig::from_yaml(yaml).unwrap();
        assert!(config.preferences.track_environment);
        assert!(!config.preferences.blinking_cursor);
        assert_eq!(config.terminal.default_rows, 24);
    }

    #[test]
    fn test_invalid_yaml() {
        let result = RegistryConfig::from_yaml("terminal: [unclosed");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }

    #[test]
    fn test_zero_rows_in_yaml_rejected() {
        let yaml = r#"
terminal:
  default_rows: 0
"#;
        assert!(RegistryConfig::from_yaml(yaml).is_err());
    }
}
