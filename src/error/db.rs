use thiserror::Error as ThisError;

use super::IsTransient;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error returned by the database-access layer, already classified.
#[derive(Debug, ThisError)]
pub enum DbError {
    /// The session is unusable (network drop, server restart, timeout).
    #[error("connection failure: {0}")]
    Connection(#[source] BoxError),

    /// The server rejected the statement itself.
    #[error("statement failure: {0}")]
    Statement(#[source] BoxError),
}

impl DbError {
    pub fn connection(err: impl Into<BoxError>) -> Self {
        DbError::Connection(err.into())
    }

    pub fn statement(err: impl Into<BoxError>) -> Self {
        DbError::Statement(err.into())
    }
}

impl IsTransient for DbError {
    fn is_transient(&self) -> bool {
        matches!(self, DbError::Connection(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if err.is_transient() {
            DbError::Connection(Box::new(err))
        } else {
            DbError::Statement(Box::new(err))
        }
    }
}

impl IsTransient for sqlx::Error {
    fn is_transient(&self) -> bool {
        match self {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => true,
            sqlx::Error::Database(db_err) => db_err
                .code()
                .is_some_and(|code| sqlstate_is_transient(&code)),
            _ => false,
        }
    }
}

/// SQLSTATE codes that indicate a lost or refused session rather than a bad
/// statement: class 08 connection exception, class 57P operator intervention
/// (shutdown, restart) and 53300 `too_many_connections`.
///
/// The rest of class 53 (`disk_full`, `out_of_memory`) and class 58 leave the
/// session usable and are not transient.
pub fn sqlstate_is_transient(code: &str) -> bool {
    code == "53300" || ["08", "57P"].iter().any(|class| code.starts_with(class))
}
