use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::export::ExportFormat;
use crate::logging::LoggingConfig;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub policy: PolicyConfig,
    pub profile: ProfileConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Optional detection policy file; the built-in tables apply when unset
    pub policy_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub profile_file: PathBuf,
    pub validate_on_load: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub default_format: String,
    pub output_directory: PathBuf,
    pub pretty_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = get_data_directory();

        Self {
            policy: PolicyConfig { policy_file: None },
            profile: ProfileConfig {
                profile_file: data_dir.join("profile.json"),
                validate_on_load: true,
            },
            export: ExportConfig {
                default_format: "json".to_string(),
                output_directory: data_dir.join("exports"),
                pretty_json: true,
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from default locations
    pub async fn load() -> Result<Self> {
        let config_path = get_config_path();

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            info!("No configuration file found, using defaults");
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Load configuration from specific file
    pub async fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to default location
    pub async fn save(&self) -> Result<()> {
        let config_path = get_config_path();

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(&config_path, content).await?;

        info!("Configuration saved to: {}", config_path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate policy configuration
        if let Some(path) = &self.policy.policy_file {
            if path.as_os_str().is_empty() {
                return Err(anyhow::anyhow!("Policy file path must not be empty"));
            }
        }

        // Validate profile configuration
        if self.profile.profile_file.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Profile file path must not be empty"));
        }

        // Validate export configuration
        if ExportFormat::from_str(&self.export.default_format).is_err() {
            return Err(anyhow::anyhow!(
                "Unknown export format: {}",
                self.export.default_format
            ));
        }

        if self.export.output_directory.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Export output directory must not be empty"));
        }

        // Validate logging configuration
        if !matches!(
            self.logging.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(anyhow::anyhow!("Unknown log level: {}", self.logging.level));
        }

        if self.logging.file_enabled && self.logging.max_files == 0 {
            return Err(anyhow::anyhow!("Logging max_files must be > 0"));
        }

        info!("Configuration validation passed");
        Ok(())
    }

    /// Ensure all required directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        let dirs_to_create = vec![
            get_data_directory(),
            self.export.output_directory.clone(),
            self.logging.log_directory.clone(),
        ];

        for dir in dirs_to_create {
            if !dir.exists() {
                tokio::fs::create_dir_all(&dir).await?;
                info!("Created directory: {}", dir.display());
            }
        }

        Ok(())
    }
}

/// Get the default data directory
fn get_data_directory() -> PathBuf {
    directories::ProjectDirs::from("com", "formfill", "studio")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default().join("data"))
}

/// Get the configuration file path
fn get_config_path() -> PathBuf {
    directories::ProjectDirs::from("com", "formfill", "studio")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default().join("config.toml"))
}

/// Environment-based configuration overrides
pub struct ConfigOverrides;

impl ConfigOverrides {
    /// Apply environment variable overrides to configuration
    pub fn apply(config: &mut AppConfig) {
        // Policy overrides
        if let Ok(policy_file) = std::env::var("FORMFILL_POLICY_FILE") {
            config.policy.policy_file = Some(PathBuf::from(policy_file));
        }

        // Profile overrides
        if let Ok(profile_file) = std::env::var("FORMFILL_PROFILE_FILE") {
            config.profile.profile_file = PathBuf::from(profile_file);
        }

        if let Ok(validate_str) = std::env::var("FORMFILL_VALIDATE_PROFILE") {
            config.profile.validate_on_load = validate_str.to_lowercase() == "true";
        }

        // Export overrides
        if let Ok(export_dir) = std::env::var("FORMFILL_EXPORT_DIR") {
            config.export.output_directory = PathBuf::from(export_dir);
        }

        if let Ok(export_format) = std::env::var("FORMFILL_EXPORT_FORMAT") {
            config.export.default_format = export_format;
        }

        // Logging overrides
        if let Ok(log_level) = std::env::var("FORMFILL_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        info!("Applied environment variable overrides");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.export.default_format, "json");
        assert!(config.policy.policy_file.is_none());
    }

    #[test]
    fn test_validate_rejects_unknown_format() {
        let mut config = AppConfig::default();
        config.export.default_format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.policy.policy_file = Some(PathBuf::from("policy.yaml"));
        config.export.pretty_json = false;

        tokio::fs::write(&path, toml::to_string_pretty(&config).unwrap())
            .await
            .unwrap();

        let loaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(loaded.policy.policy_file, Some(PathBuf::from("policy.yaml")));
        assert!(!loaded.export.pretty_json);
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var("FORMFILL_EXPORT_FORMAT", "csv");
        std::env::set_var("FORMFILL_VALIDATE_PROFILE", "false");

        let mut config = AppConfig::default();
        ConfigOverrides::apply(&mut config);

        assert_eq!(config.export.default_format, "csv");
        assert!(!config.profile.validate_on_load);

        std::env::remove_var("FORMFILL_EXPORT_FORMAT");
        std::env::remove_var("FORMFILL_VALIDATE_PROFILE");
    }
}
