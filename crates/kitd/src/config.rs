//! Configuration management for the kit daemon.
//!
//! This module handles loading and validation of the daemon configuration
//! from a TOML file, plus applying command-line overrides.

use crate::cli::CliArgs;
use serde::{Deserialize, Serialize};
use starter_kits::ItemCatalog;
use std::path::{Path, PathBuf};
use tracing::info;

/// Daemon configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Data directory settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Who may receive kits and run operator commands
    #[serde(default)]
    pub permissions: PermissionSettings,
    /// Extra item types on top of the built-in catalog
    #[serde(default)]
    pub catalog: CatalogSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Directory holding `config.toml` and `players.lst`
    pub data_directory: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            data_directory: "plugins/starterkits".to_string(),
        }
    }
}

/// Console-side permission model.
///
/// Operators hold every capability. Everyone else may receive kits unless
/// listed in `denied`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionSettings {
    #[serde(default = "default_operators")]
    pub operators: Vec<String>,
    #[serde(default)]
    pub denied: Vec<String>,
}

fn default_operators() -> Vec<String> {
    vec!["console".to_string()]
}

impl Default for PermissionSettings {
    fn default() -> Self {
        Self {
            operators: default_operators(),
            denied: vec![],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub extra_items: Vec<String>,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration to `path`
    /// and returns it.
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Applies command-line overrides on top of the file settings.
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(dir) = &args.data_dir {
            self.server.data_directory = dir.display().to_string();
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if args.json_logs {
            self.logging.json_format = true;
        }
    }

    pub fn data_directory(&self) -> PathBuf {
        PathBuf::from(&self.server.data_directory)
    }

    /// Built-in catalog extended with `catalog.extra_items`.
    pub fn item_catalog(&self) -> ItemCatalog {
        let mut catalog = ItemCatalog::builtin();
        catalog.extend(self.catalog.extra_items.iter().cloned());
        catalog
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.data_directory.trim().is_empty() {
            return Err("Data directory cannot be empty".to_string());
        }

        if let Some(name) = self.permissions.operators.iter().find(|name| name.trim().is_empty()) {
            return Err(format!("Invalid operator name: {name:?}"));
        }

        if let Some(item) = self.catalog.extra_items.iter().find(|item| item.trim().is_empty()) {
            return Err(format!("Invalid catalog item: {item:?}"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.server.data_directory, "plugins/starterkits");
        assert_eq!(config.permissions.operators, vec!["console".to_string()]);
        assert!(config.permissions.denied.is_empty());
        assert!(config.catalog.extra_items.is_empty());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kitd.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();

        assert_eq!(config.server.data_directory, "plugins/starterkits");
        assert!(path.exists());

        // The written file loads back to the same settings.
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.permissions.operators, config.permissions.operators);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[server]
data_directory = "/srv/kits"

[permissions]
operators = ["admin"]
denied = ["griefer"]

[catalog]
extra_items = ["RUBY"]

[logging]
level = "debug"
json_format = true
"#;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kitd.toml");
        tokio::fs::write(&path, toml_content).await.unwrap();

        let config = AppConfig::load_from_file(&path).await.unwrap();

        assert_eq!(config.data_directory(), PathBuf::from("/srv/kits"));
        assert_eq!(config.permissions.operators, vec!["admin".to_string()]);
        assert_eq!(config.permissions.denied, vec!["griefer".to_string()]);
        assert!(config.item_catalog().contains("RUBY"));
        assert!(config.item_catalog().contains("STONE"));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[tokio::test]
    async fn test_load_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kitd.toml");
        tokio::fs::write(&path, "[logging]\nlevel = \"warn\"\n").await.unwrap();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.server.data_directory, "plugins/starterkits");
        assert_eq!(config.permissions.operators, vec!["console".to_string()]);
    }

    #[tokio::test]
    async fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kitd.toml");
        tokio::fs::write(&path, "[server\n").await.unwrap();

        assert!(AppConfig::load_from_file(&path).await.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().unwrap_err().contains("Invalid log level"));

        let mut config = AppConfig::default();
        config.server.data_directory = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.catalog.extra_items.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_cli_overrides() {
        let mut config = AppConfig::default();
        let args = CliArgs {
            config_path: PathBuf::from("kitd.toml"),
            data_dir: Some(PathBuf::from("data")),
            log_level: Some("trace".to_string()),
            json_logs: true,
        };

        config.apply_cli(&args);

        assert_eq!(config.server.data_directory, "data");
        assert_eq!(config.logging.level, "trace");
        assert!(config.logging.json_format);
    }
}
