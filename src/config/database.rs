use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::IndexerError;

/// PostgreSQL credentials.
#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// TOML: `database.host`. Default: `localhost`.
    #[serde(default = "default_host")]
    pub host: String,

    /// TOML: `database.port`. Default: `5432`.
    #[serde(default = "default_port")]
    pub port: u16,

    /// TOML: `database.database`. Required, non-empty.
    #[serde(default)]
    pub database: String,

    /// TOML: `database.user`. Required, non-empty.
    #[serde(default)]
    pub user: String,

    /// TOML: `database.password`. Accepts a string or a bare number.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub password: String,

    /// Upper bound on establishing one connection.
    /// TOML: `database.connect_timeout_secs`. Default: `30`.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: "".to_string(),
            user: "".to_string(),
            password: "".to_string(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), IndexerError> {
        for (field, value) in [
            ("database.host", &self.host),
            ("database.database", &self.database),
            ("database.user", &self.user),
        ] {
            if value.trim().is_empty() {
                return Err(IndexerError::InvalidConfig(format!(
                    "{field} must be set and non-empty"
                )));
            }
        }
        if self.connect_timeout_secs == 0 {
            return Err(IndexerError::InvalidConfig(
                "database.connect_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for database.password",
        )),
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_connect_timeout_secs() -> u64 {
    30
}
