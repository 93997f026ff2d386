//! Configuration management for the library client

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// Navigable catalog URL that filters are mirrored into
    pub app_url: String,
    pub page_size: u32,
    pub search_debounce_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoanConfig {
    pub duration_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub loans: LoanConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Defaults are compiled in, files are optional for a client
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables, e.g. UNILIB__API__BASE_URL for api.base_url
            .add_source(
                Environment::with_prefix("UNILIB")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("api.base_url", env::var("API_URL").ok())?
            .set_override_option("api.token", env::var("API_TOKEN").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 15,
            token: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".unilib"),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:5173/books".to_string(),
            page_size: 12,
            search_debounce_ms: 500,
        }
    }
}

impl Default for LoanConfig {
    fn default() -> Self {
        Self { duration_days: 14 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_uses_double_underscore_prefix() {
        env::set_var("UNILIB__LOANS__DURATION_DAYS", "21");
        let config = AppConfig::load().unwrap();
        env::remove_var("UNILIB__LOANS__DURATION_DAYS");

        assert_eq!(config.loans.duration_days, 21);
        assert_eq!(config.catalog.page_size, 12);
    }
}
