use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{ReportError, Result};

/// Configuration shared by both report binaries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub readiness: ReadinessConfig,
    /// Credentials only ever come from the environment
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

#[derive(Clone, Default)]
pub struct Credentials {
    pub database: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "database".to_string(),
            port: 5432,
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_retries: 30,
            retry_delay_secs: 2,
        }
    }
}

impl ReadinessConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Config {
    /// Load configuration from `.env`, an optional YAML file and the process
    /// environment. Fails before any connection is attempted when required
    /// credentials are missing or an override cannot be parsed.
    pub fn load() -> Result<Self> {
        for path in [".env", "../.env"] {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                break;
            }
        }

        let config_path =
            env::var("BEER_REPORT_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
        let mut config = Self::from_file(Path::new(&config_path));

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read the YAML file, falling back to defaults when it is absent or broken
    fn from_file(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("Config file not found at {} - using defaults", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_yaml(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to parse config file {}: {} - using defaults",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!(
                    "Failed to read config file {}: {} - using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn from_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            self.database.port = port
                .parse()
                .map_err(|_| ReportError::invalid_value("DB_PORT", port))?;
        }

        if let Some(retries) = lookup("BEER_WAIT_MAX_RETRIES") {
            self.readiness.max_retries = retries
                .parse()
                .map_err(|_| ReportError::invalid_value("BEER_WAIT_MAX_RETRIES", retries))?;
        }
        if let Some(delay) = lookup("BEER_WAIT_RETRY_DELAY_SECS") {
            self.readiness.retry_delay_secs = delay
                .parse()
                .map_err(|_| ReportError::invalid_value("BEER_WAIT_RETRY_DELAY_SECS", delay))?;
        }

        self.credentials = Credentials {
            database: required(&lookup, "POSTGRES_DB")?,
            user: required(&lookup, "POSTGRES_USER")?,
            password: required(&lookup, "POSTGRES_PASSWORD")?,
        };
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.database.host.trim().is_empty() {
            return Err(ReportError::InvalidConfig(
                "database host cannot be empty".to_string(),
            ));
        }
        if self.database.port == 0 {
            return Err(ReportError::InvalidConfig(
                "database port cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ReportError::MissingEnv(key)),
    }
}
