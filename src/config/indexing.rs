use inrix_partition::PartitionSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::IndexerError;
use crate::indexer::{BuilderSettings, CreateMode, FatalPolicy, ReconnectPolicy, TableRef};

/// Which partitions to index and how to ride out connection loss.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexingConfig {
    /// TOML: `indexing.schema`. Default: `inrix`.
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Partition tables are named `<base_table><YYYYMM>`.
    /// TOML: `indexing.base_table`. Default: `raw_data`.
    #[serde(default = "default_base_table")]
    pub base_table: String,

    /// Seconds to wait before reconnecting after a failed liveness probe.
    /// TOML: `indexing.retry_interval_secs`. Default: `120`.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    /// Render named `CREATE INDEX IF NOT EXISTS` statements so a batch
    /// restarted after a partial commit does not duplicate indexes.
    /// TOML: `indexing.if_not_exists`. Default: `false`.
    #[serde(default)]
    pub if_not_exists: bool,

    /// `abort` or `skip` on statements the server rejects.
    /// TOML: `indexing.on_fatal`. Default: `abort`.
    #[serde(default)]
    pub on_fatal: FatalPolicy,

    /// TOML: `[[indexing.partitions]]` entries with `year` and `months`
    /// (a list, or `{ from, to }` inclusive).
    #[serde(default)]
    pub partitions: PartitionSet,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            base_table: default_base_table(),
            retry_interval_secs: default_retry_interval_secs(),
            if_not_exists: false,
            on_fatal: FatalPolicy::default(),
            partitions: PartitionSet::default(),
        }
    }
}

impl IndexingConfig {
    pub fn validate(&self) -> Result<(), IndexerError> {
        self.table()?;
        self.partitions.validate()?;
        Ok(())
    }

    pub fn table(&self) -> Result<TableRef, IndexerError> {
        TableRef::new(&self.schema, &self.base_table)
    }

    pub fn builder_settings(&self) -> Result<BuilderSettings, IndexerError> {
        Ok(BuilderSettings {
            table: self.table()?,
            mode: if self.if_not_exists {
                CreateMode::IfNotExists
            } else {
                CreateMode::Plain
            },
            reconnect: ReconnectPolicy::fixed(Duration::from_secs(self.retry_interval_secs)),
            on_fatal: self.on_fatal,
        })
    }
}

fn default_schema() -> String {
    "inrix".to_string()
}

fn default_base_table() -> String {
    "raw_data".to_string()
}

fn default_retry_interval_secs() -> u64 {
    120
}
