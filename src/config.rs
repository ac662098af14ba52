use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{DeskError, Result};
use crate::session::SessionPolicy;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub view: ViewConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the embedded key-value database
    pub data_dir: String,
    /// Most recent attendance entries kept on save
    pub attendance_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub policy: SessionPolicy,
    pub landing_page: String,
    pub demo_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub student_page_size: usize,
    pub recent_complaints_limit: usize,
    pub incharge_attendance_limit: usize,
    pub history_limit: usize,
    pub search_debounce_ms: u64,
    pub clock_tick_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            student_page_size: 8,
            recent_complaints_limit: 6,
            incharge_attendance_limit: 50,
            history_limit: 20,
            search_debounce_ms: 250,
            clock_tick_secs: 60,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: "data/schoolbus".to_string(),
                attendance_cap: 200,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            session: SessionConfig {
                policy: SessionPolicy::PermissiveDemo,
                landing_page: "index.html".to_string(),
                demo_token: "demo-token".to_string(),
            },
            view: ViewConfig::default(),
            api: ApiConfig {
                base_url: "http://localhost:5000/api".to_string(),
                timeout_secs: 15,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("schoolbus").required(false))
            // Environment variables, e.g. SCHOOLBUS__VIEW__STUDENT_PAGE_SIZE=10
            .add_source(Environment::with_prefix("SCHOOLBUS").separator("__"))
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(DeskError::InvalidConfig("storage.data_dir cannot be empty".into()));
        }
        if self.storage.attendance_cap == 0 {
            return Err(DeskError::InvalidConfig(
                "storage.attendance_cap must be greater than 0".into(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(DeskError::InvalidConfig(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(DeskError::InvalidConfig(format!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format, valid_formats
            )));
        }

        if self.session.landing_page.trim().is_empty() {
            return Err(DeskError::InvalidConfig("session.landing_page cannot be empty".into()));
        }
        if self.session.demo_token.trim().is_empty() {
            return Err(DeskError::InvalidConfig("session.demo_token cannot be empty".into()));
        }

        if self.view.student_page_size == 0 {
            return Err(DeskError::InvalidConfig(
                "view.student_page_size must be greater than 0".into(),
            ));
        }
        if self.view.clock_tick_secs == 0 {
            return Err(DeskError::InvalidConfig(
                "view.clock_tick_secs must be greater than 0".into(),
            ));
        }

        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            return Err(DeskError::InvalidConfig(format!(
                "api.base_url must be an http(s) URL, got {:?}",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(DeskError::InvalidConfig("api.timeout_secs must be greater than 0".into()));
        }

        Ok(())
    }

    /// Data directory, overridable with `SCHOOLBUS_DATA_DIR`
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        std::env::var("SCHOOLBUS_DATA_DIR")
            .map_or_else(|_| PathBuf::from(&self.storage.data_dir), PathBuf::from)
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| DeskError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage.attendance_cap, 200);
        assert_eq!(config.view.student_page_size, 8);
        assert_eq!(config.session.policy, SessionPolicy::PermissiveDemo);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.view.student_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_names_policy_in_kebab_case() {
        let yaml = AppConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("policy: permissive-demo"));
    }
}
