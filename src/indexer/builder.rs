use backon::ConstantBackoff;
use chrono::{DateTime, Utc};
use inrix_partition::{PartitionKey, PartitionSet};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::index::{CreateMode, IndexSpec, PartitionTable, TableRef};
use super::retry::ReconnectPolicy;
use crate::db::{Connector, Session};
use crate::error::{DbError, IndexerError, IsTransient};

/// What to do when the server rejects a DDL statement outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalPolicy {
    /// Stop the run and return the error.
    #[default]
    Abort,
    /// Log it, leave the partition as it is and move on to the next one.
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct BuilderSettings {
    pub table: TableRef,
    pub mode: CreateMode,
    pub reconnect: ReconnectPolicy,
    pub on_fatal: FatalPolicy,
}

/// States of the per-partition retry machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Probe the session; on loss wait, reconnect and probe again.
    ConnectionCheck,
    /// Issue the whole statement batch for the partition, from the first one.
    ExecuteBatch,
}

#[derive(Debug)]
enum Outcome {
    Success,
    TransientFailure(DbError),
    FatalFailure(IndexerError),
}

impl Outcome {
    fn classify(
        result: Result<(), DbError>,
        fatal: impl FnOnce(DbError) -> IndexerError,
    ) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(e) if e.is_transient() => Outcome::TransientFailure(e),
            Err(e) => Outcome::FatalFailure(fatal(e)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// DDL statements that completed.
    pub statements: usize,
    pub probes: usize,
    /// Sessions replaced after a failed probe.
    pub reconnects: usize,
    /// Batches abandoned mid-way and sent back to the connection check.
    pub restarts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionOutcome {
    Indexed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub indexed: usize,
    /// Suffixes of partitions left incomplete under `FatalPolicy::Skip`.
    pub skipped: Vec<String>,
    pub statements: usize,
    pub reconnects: usize,
    pub restarts: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Owns the single database session for a run and walks every partition
/// through `Phase::ConnectionCheck` → `Phase::ExecuteBatch`.
///
/// Connection-level failures never escape: the builder waits, reconnects and
/// retries for as long as it takes. Anything else surfaces per `FatalPolicy`.
pub struct IndexBuilder<C: Connector> {
    connector: C,
    session: C::Session,
    settings: BuilderSettings,
    backoff: ConstantBackoff,
    counters: Counters,
}

impl<C: Connector> IndexBuilder<C> {
    /// Opens the initial session. This is the only place a connection failure
    /// is returned to the caller.
    pub async fn connect(connector: C, settings: BuilderSettings) -> Result<Self, IndexerError> {
        let endpoint = connector.endpoint();
        info!(
            host = %endpoint.host,
            database = %endpoint.database,
            user = %endpoint.user,
            "Connecting to database"
        );
        let session = connector.connect().await.map_err(|source| {
            error!(error = %source, "Initial connection failed");
            IndexerError::Connect {
                host: endpoint.host,
                database: endpoint.database,
                source,
            }
        })?;

        let backoff = settings.reconnect.schedule();
        Ok(Self {
            connector,
            session,
            settings,
            backoff,
            counters: Counters::default(),
        })
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Indexes every partition in set order, then closes the session.
    pub async fn run(mut self, partitions: &PartitionSet) -> Result<RunReport, IndexerError> {
        let keys = partitions.keys()?;
        let started_at = Utc::now();
        info!(partitions = keys.len(), "Starting index build");

        let mut indexed = 0;
        let mut skipped = Vec::new();
        for key in &keys {
            match self.index_partition(key).await? {
                PartitionOutcome::Indexed => indexed += 1,
                PartitionOutcome::Skipped => skipped.push(key.suffix()),
            }
        }

        let Self {
            connector,
            session,
            counters,
            ..
        } = self;
        if let Err(e) = session.close().await {
            warn!(error = %e, "Closing connection failed");
        }
        let endpoint = connector.endpoint();
        info!(
            host = %endpoint.host,
            database = %endpoint.database,
            indexed,
            skipped = skipped.len(),
            "Processing complete, connection closed"
        );

        Ok(RunReport {
            indexed,
            skipped,
            statements: counters.statements,
            reconnects: counters.reconnects,
            restarts: counters.restarts,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Drives one partition until all three indexes are created.
    pub async fn index_partition(
        &mut self,
        key: &PartitionKey,
    ) -> Result<PartitionOutcome, IndexerError> {
        let table = self.settings.table.partition(key);
        info!(table = %table, "Creating indexes on table");

        let mut phase = Phase::ConnectionCheck;
        loop {
            match self.advance(phase, &table).await {
                Ok(Some(next)) => phase = next,
                Ok(None) => return Ok(PartitionOutcome::Indexed),
                Err(e @ IndexerError::Statement { .. })
                    if self.settings.on_fatal == FatalPolicy::Skip =>
                {
                    error!(table = %table, error = %e, "Skipping partition");
                    return Ok(PartitionOutcome::Skipped);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Performs one transition. `Ok(None)` means the partition is done.
    pub async fn advance(
        &mut self,
        phase: Phase,
        table: &PartitionTable,
    ) -> Result<Option<Phase>, IndexerError> {
        match phase {
            Phase::ConnectionCheck => match self.check_connection().await {
                Outcome::Success => Ok(Some(Phase::ExecuteBatch)),
                Outcome::TransientFailure(e) => {
                    error!(error = %e, "Connection check failed");
                    self.reconnect().await?;
                    Ok(Some(Phase::ConnectionCheck))
                }
                Outcome::FatalFailure(e) => Err(e),
            },
            Phase::ExecuteBatch => match self.execute_batch(table).await {
                Outcome::Success => Ok(None),
                Outcome::TransientFailure(e) => {
                    error!(table = %table, error = %e, "Index creation interrupted");
                    self.counters.restarts += 1;
                    Ok(Some(Phase::ConnectionCheck))
                }
                Outcome::FatalFailure(e) => Err(e),
            },
        }
    }

    async fn check_connection(&mut self) -> Outcome {
        info!("Testing connection");
        self.counters.probes += 1;
        Outcome::classify(self.session.probe().await, IndexerError::Probe)
    }

    /// One backoff wait, then one connect attempt. A transient connect
    /// failure keeps the old session; the next probe fails and lands here
    /// again.
    async fn reconnect(&mut self) -> Result<(), IndexerError> {
        let delay = self
            .backoff
            .next()
            .unwrap_or(self.settings.reconnect.interval());
        info!(delay = ?delay, "Retrying connection after backoff");
        sleep(delay).await;

        match self.connector.connect().await {
            Ok(session) => {
                self.session = session;
                self.counters.reconnects += 1;
                info!("Reconnected to database");
                Ok(())
            }
            Err(e) if e.is_transient() => {
                warn!(error = %e, "Reconnect attempt failed");
                Ok(())
            }
            Err(e) => Err(IndexerError::Reconnect(e)),
        }
    }

    async fn execute_batch(&mut self, table: &PartitionTable) -> Outcome {
        for index in IndexSpec::ALL {
            info!(table = %table, index = index.label(), "Creating {} index", index.label());
            let sql = index.statement(table, self.settings.mode);
            if let Err(e) = self.session.execute(&sql).await {
                return Outcome::classify(Err(e), |source| IndexerError::Statement {
                    table: table.qualified(),
                    index: index.label(),
                    source,
                });
            }
            self.counters.statements += 1;
        }
        Outcome::Success
    }
}
