mod db;
mod indexer;

pub use db::{BoxError, DbError, sqlstate_is_transient};
pub use indexer::IndexerError;

/// Failures that clear up once the connection is re-established.
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}
