//! Resilient index builder.
//!
//! Layout:
//! - `index.rs`: the three fixed index definitions and partition table naming
//! - `retry.rs`: fixed-interval reconnect schedule
//! - `builder.rs`: per-partition state machine driving a `db::Session`

mod builder;
mod index;
mod retry;

pub use builder::{
    BuilderSettings, Counters, FatalPolicy, IndexBuilder, PartitionOutcome, Phase, RunReport,
};
pub use index::{CreateMode, IndexSpec, PartitionTable, TableRef};
pub use retry::{DEFAULT_RECONNECT_INTERVAL, ReconnectPolicy};
