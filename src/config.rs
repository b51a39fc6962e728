//! Configuration management for Ecoguard
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{EcoguardError, Result};
use crate::session::{Credentials, PortalSettings};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Portal account credentials
    pub account: AccountConfig,

    /// Portal endpoint configuration
    pub portal: PortalConfig,

    /// Interval between refresh cycles in seconds
    pub refresh_interval_secs: u64,

    /// Time zone the portal reports dates and hours in
    pub timezone: String,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// History cache persistence
    pub persistence: PersistenceConfig,

    /// Statistics export configuration
    pub statistics: StatisticsConfig,
}

/// Portal account credentials
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccountConfig {
    /// Rentable object number used as login name
    pub username: String,

    pub password: String,

    /// Housing database name as shown on the login page (may contain diacritics)
    pub database: String,
}

/// Portal endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Portal base URL without trailing slash
    pub base_url: String,

    /// Path of the form-post login endpoint
    pub login_path: String,

    /// Utility code passed to the consumption tables
    pub utility_code: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// History cache persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,

    /// JSON file holding the month cache, rate cache and cached daily readings
    pub state_file: String,
}

/// Statistics export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Directory receiving one JSON document per statistic
    pub output_dir: String,

    /// Currency unit of the cost statistic
    pub currency: String,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "ecoguard_config.yaml",
            "/data/ecoguard_config.yaml",
            "/etc/ecoguard/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Override credentials from `ECOGUARD_USERNAME`, `ECOGUARD_PASSWORD`
    /// and `ECOGUARD_DATABASE` when set and non-empty
    pub fn apply_env_overrides(&mut self) {
        let overrides = [
            ("ECOGUARD_USERNAME", &mut self.account.username),
            ("ECOGUARD_PASSWORD", &mut self.account.password),
            ("ECOGUARD_DATABASE", &mut self.account.database),
        ];
        for (var, slot) in overrides {
            if let Ok(value) = std::env::var(var)
                && !value.is_empty()
            {
                *slot = value;
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.account.username.trim().is_empty() {
            return Err(EcoguardError::validation(
                "account.username",
                "Username cannot be empty",
            ));
        }

        if self.account.password.is_empty() {
            return Err(EcoguardError::validation(
                "account.password",
                "Password cannot be empty",
            ));
        }

        if self.account.database.trim().is_empty() {
            return Err(EcoguardError::validation(
                "account.database",
                "Database cannot be empty",
            ));
        }

        if reqwest::Url::parse(&self.portal.base_url).is_err() {
            return Err(EcoguardError::validation(
                "portal.base_url",
                "Must be an absolute URL",
            ));
        }

        if !self.portal.login_path.starts_with('/') {
            return Err(EcoguardError::validation(
                "portal.login_path",
                "Must start with '/'",
            ));
        }

        if self.portal.timeout_secs == 0 {
            return Err(EcoguardError::validation(
                "portal.timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.refresh_interval_secs == 0 {
            return Err(EcoguardError::validation(
                "refresh_interval_secs",
                "Must be greater than 0",
            ));
        }

        self.timezone()?;

        Ok(())
    }

    /// Parsed time zone
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            EcoguardError::validation("timezone", "Unknown IANA time zone")
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Credentials for the login handshake
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.account.username.clone(),
            password: self.account.password.clone(),
            database: self.account.database.clone(),
        }
    }

    /// Session settings for the portal client
    pub fn portal_settings(&self) -> PortalSettings {
        PortalSettings {
            base_url: self.portal.base_url.trim_end_matches('/').to_string(),
            login_path: self.portal.login_path.clone(),
            utility_code: self.portal.utility_code.clone(),
            timeout: Duration::from_secs(self.portal.timeout_secs),
            user_agent: format!("ecoguard/{}", env!("APP_VERSION")),
        }
    }
}
