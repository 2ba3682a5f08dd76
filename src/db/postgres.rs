use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection, Executor};
use std::time::Duration;
use tracing::{debug, trace};

use super::{Connector, Endpoint, PROBE_SQL, Session};
use crate::config::DatabaseConfig;
use crate::error::DbError;

/// Opens one `PgConnection` per session; no pool, the builder never needs
/// more than a single connection.
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
    endpoint: Endpoint,
    connect_timeout: Duration,
}

impl PgConnector {
    pub fn new(cfg: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&cfg.host)
            .port(cfg.port)
            .database(&cfg.database)
            .username(&cfg.user)
            .password(&cfg.password)
            .application_name(env!("CARGO_PKG_NAME"))
            .disable_statement_logging();

        Self {
            options,
            endpoint: Endpoint {
                host: cfg.host.clone(),
                database: cfg.database.clone(),
                user: cfg.user.clone(),
            },
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Session = PgSession;

    fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }

    async fn connect(&self) -> Result<PgSession, DbError> {
        debug!(endpoint = %self.endpoint, "Opening PostgreSQL connection");
        let connect = PgConnection::connect_with(&self.options);
        let conn = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| {
                DbError::connection(format!(
                    "connect to {} timed out after {:?}",
                    self.endpoint, self.connect_timeout
                ))
            })??;
        Ok(PgSession { conn })
    }
}

/// Single PostgreSQL connection. Statements carry no bind arguments, so they
/// go through the simple query protocol outside any transaction and each one
/// commits immediately.
pub struct PgSession {
    conn: PgConnection,
}

#[async_trait]
impl Session for PgSession {
    async fn probe(&mut self) -> Result<(), DbError> {
        Executor::execute(&mut self.conn, PROBE_SQL).await?;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        trace!(sql, "Executing statement");
        Executor::execute(&mut self.conn, sql).await?;
        Ok(())
    }

    async fn close(self) -> Result<(), DbError> {
        self.conn.close().await?;
        Ok(())
    }
}
