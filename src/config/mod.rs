mod basic;
mod database;
mod indexing;

pub use basic::BasicConfig;
pub use database::DatabaseConfig;
pub use indexing::IndexingConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};

use crate::error::IndexerError;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Process-level settings (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Connection credentials (see `database` table in config.toml).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Target tables, partitions and retry behaviour (see `indexing` table).
    #[serde(default)]
    pub indexing: IndexingConfig,
}

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "INDEXER_CONFIG";

/// Prefix for per-field overrides, e.g. `INDEXER_DATABASE__HOST`.
pub const ENV_PREFIX: &str = "INDEXER_";

impl Config {
    /// Defaults, then the TOML file at `path` if it exists, then `INDEXER_*`
    /// environment variables.
    pub fn figment_from(path: impl AsRef<Path>) -> Figment {
        let path = path.as_ref();
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if path.is_file() {
            figment.merge(Toml::file(path))
        } else {
            figment
        };
        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
    }

    pub fn figment() -> Figment {
        Self::figment_from(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Loads and validates configuration from the default sources.
    pub fn load() -> Result<Self, IndexerError> {
        Self::extract_from(Self::figment())
    }

    pub fn extract_from(figment: Figment) -> Result<Self, IndexerError> {
        let cfg: Self = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), IndexerError> {
        self.database.validate()?;
        self.indexing.validate()?;
        Ok(())
    }
}
