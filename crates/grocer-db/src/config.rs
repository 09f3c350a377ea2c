//! # Store Configuration
//!
//! File and environment configuration for opening a store.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GROCER_DB_PATH=/var/lib/grocer/grocer.db                           │
//! │     GROCER_MAX_CONNECTIONS=5                                           │
//! │     GROCER_COMPANY_NAME="Corner Shop"                                  │
//! │     GROCER_CURRENCY=SAR                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/grocer.toml (Linux)                                  │
//! │     ~/Library/Application Support/com.grocer.pos/grocer.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "grocer.db"
//! max_connections = 5
//! min_connections = 1
//! acquire_timeout_secs = 30
//! run_migrations = true
//!
//! [store]
//! company_name = "My Grocery"
//! currency = "YER"
//! tax_rate = 0.0            # percent
//! low_stock_threshold = 5
//! ```
//!
//! The `[store]` section only provides first-run values for the settings
//! collection; once the store exists, the settings collection wins.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use grocer_core::{TaxRate, DEFAULT_LOW_STOCK_THRESHOLD};

use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;
use crate::repository::settings::{StoreSettings, DEFAULT_COMPANY_NAME, DEFAULT_CURRENCY};

// =============================================================================
// Database Section
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// SQLite file path, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_path() -> PathBuf {
    directories::ProjectDirs::from("com", "grocer", "pos")
        .map(|dirs| dirs.data_dir().join("grocer.db"))
        .unwrap_or_else(|| PathBuf::from("grocer.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: default_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Store Section
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_company_name")]
    pub company_name: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Percent, e.g. `15.0`.
    #[serde(default)]
    pub tax_rate: f64,

    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
}

fn default_company_name() -> String {
    DEFAULT_COMPANY_NAME.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_low_stock_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for StoreSection {
    fn default() -> Self {
        StoreSection {
            company_name: default_company_name(),
            currency: default_currency(),
            tax_rate: 0.0,
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub store: StoreSection,
}

impl StoreConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (grocer.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> DbResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| DbError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DbError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| DbError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Store config saved");
        Ok(())
    }

    pub fn validate(&self) -> DbResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(DbError::InvalidConfig("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(DbError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(DbError::InvalidConfig(
                "database.min_connections exceeds max_connections".into(),
            ));
        }

        if self.store.tax_rate < 0.0 {
            return Err(DbError::InvalidConfig("store.tax_rate must not be negative".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("GROCER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("GROCER_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid GROCER_MAX_CONNECTIONS"),
            }
        }

        if let Some(name) = lookup("GROCER_COMPANY_NAME") {
            self.store.company_name = name;
        }

        if let Some(currency) = lookup("GROCER_CURRENCY") {
            self.store.currency = currency;
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "grocer", "pos")
            .map(|dirs| dirs.config_dir().join("grocer.toml"))
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    pub fn to_db_config(&self) -> DbConfig {
        let db = &self.database;
        let config = if db.path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&db.path)
                .max_connections(db.max_connections)
                .min_connections(db.min_connections)
        };

        config
            .acquire_timeout(Duration::from_secs(db.acquire_timeout_secs))
            .run_migrations(db.run_migrations)
    }

    pub fn to_store_settings(&self) -> StoreSettings {
        StoreSettings {
            company_name: self.store.company_name.clone(),
            currency: self.store.currency.clone(),
            tax_rate: TaxRate::from_percentage(self.store.tax_rate),
            low_stock_threshold: self.store.low_stock_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.to_store_settings(), StoreSettings::default());
    }

    #[test]
    fn test_validation() {
        let mut config = StoreConfig::default();

        config.database.path = PathBuf::new();
        assert!(matches!(config.validate(), Err(DbError::InvalidConfig(_))));

        config.database.path = PathBuf::from("grocer.db");
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(DbError::InvalidConfig(_))));

        config.database.max_connections = 2;
        config.database.min_connections = 3;
        assert!(config.validate().is_err());

        config.database.min_connections = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: StoreConfig = toml::from_str(
            r#"
            [store]
            currency = "SAR"
            tax_rate = 15.0
            "#,
        )
        .unwrap();

        assert_eq!(config.store.currency, "SAR");
        assert_eq!(config.store.company_name, DEFAULT_COMPANY_NAME);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.to_store_settings().tax_rate, TaxRate::from_bps(1500));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("GROCER_DB_PATH", "/tmp/shop.db"),
            ("GROCER_MAX_CONNECTIONS", "not-a-number"),
            ("GROCER_CURRENCY", "USD"),
        ]
        .into_iter()
        .collect();

        let mut config = StoreConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.store.currency, "USD");
        assert_eq!(config.store.company_name, DEFAULT_COMPANY_NAME);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("grocer.toml");

        let mut config = StoreConfig::default();
        config.database.path = dir.path().join("shop.db");
        config.store.company_name = "Corner Shop".to_string();
        config.save(Some(path.clone())).unwrap();

        let loaded: StoreConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_in_memory_path() {
        let mut config = StoreConfig::default();
        config.database.path = PathBuf::from(":memory:");
        assert!(config.to_db_config().is_in_memory());
    }
}
