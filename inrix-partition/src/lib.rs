//! Partition naming for the month-partitioned `raw_data` table set.
//!
//! Every calendar month lives in its own physical table whose name ends in a
//! `YYYYMM` suffix. This crate owns that derivation together with the
//! `PartitionKey` and `PartitionSet` types the indexer consumes.

mod error;
mod key;
mod set;

pub use error::PartitionError;
pub use key::{PartitionKey, suffix};
pub use set::{Months, PartitionSet, YearPartitions};
