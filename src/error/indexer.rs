use inrix_partition::PartitionError;
use thiserror::Error as ThisError;

use super::DbError;

#[derive(Debug, ThisError)]
pub enum IndexerError {
    #[error("could not connect to {host}/{database}: {source}")]
    Connect {
        host: String,
        database: String,
        #[source]
        source: DbError,
    },

    #[error("reconnect rejected: {0}")]
    Reconnect(#[source] DbError),

    #[error("liveness probe failed: {0}")]
    Probe(#[source] DbError),

    #[error("creating {index} index on {table} failed: {source}")]
    Statement {
        table: String,
        index: &'static str,
        #[source]
        source: DbError,
    },

    #[error("invalid SQL identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("base table name {base:?} is too long for its partition indexes (max {max} chars)")]
    IdentifierTooLong { base: String, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error(transparent)]
    Partition(#[from] PartitionError),
}

impl From<figment::Error> for IndexerError {
    fn from(err: figment::Error) -> Self {
        IndexerError::Config(Box::new(err))
    }
}
