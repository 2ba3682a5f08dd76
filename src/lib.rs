pub mod config;
pub mod db;
pub mod error;
pub mod indexer;
pub mod utils;

pub use error::{DbError, IndexerError, IsTransient};
pub use indexer::{IndexBuilder, RunReport};
pub use inrix_partition::{PartitionKey, PartitionSet, suffix};
