//! Database access: the session abstraction the index builder drives, and
//! its PostgreSQL implementation.
//!
//! Layout:
//! - `mod.rs`: `Session` / `Connector` traits and the `Endpoint` description
//! - `postgres.rs`: sqlx-backed single-connection session

pub mod postgres;

use async_trait::async_trait;
use std::fmt;

use crate::error::DbError;

pub use postgres::{PgConnector, PgSession};

/// Liveness probe issued before every batch.
pub const PROBE_SQL: &str = "SELECT 1";

/// Who a connector talks to, for log lines and error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub database: String,
    pub user: String,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.user, self.host, self.database)
    }
}

/// A live, autocommit database session.
#[async_trait]
pub trait Session: Send {
    /// Run the liveness probe. Must not change server state.
    async fn probe(&mut self) -> Result<(), DbError>;

    /// Execute one DDL statement; it commits on its own.
    async fn execute(&mut self, sql: &str) -> Result<(), DbError>;

    async fn close(self) -> Result<(), DbError>
    where
        Self: Sized;
}

/// Opens fresh sessions with a fixed set of credentials.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: Session;

    fn endpoint(&self) -> Endpoint;

    async fn connect(&self) -> Result<Self::Session, DbError>;
}
