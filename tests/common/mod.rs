#![allow(dead_code)]

use async_trait::async_trait;
use inrix_indexer::db::{Connector, Endpoint, Session};
use inrix_indexer::error::DbError;
use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Everything the fake server saw, in order. Session ids start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect(usize),
    ConnectFailed,
    Probe(usize),
    Execute(usize, String),
    Close(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Drops the session; every later call on it fails the same way.
    Transient,
    Fatal,
}

/// Fires on the n-th call (1-based, counted across all sessions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Connect(usize),
    Probe(usize),
    Execute(usize),
}

#[derive(Default)]
struct Backend {
    events: Vec<Event>,
    faults: Vec<(Trigger, Fault)>,
    connects: usize,
    probes: usize,
    executes: usize,
    sessions: usize,
    broken: HashSet<usize>,
}

impl Backend {
    fn take_fault(&mut self, trigger: Trigger) -> Option<Fault> {
        let pos = self.faults.iter().position(|(t, _)| *t == trigger)?;
        Some(self.faults.remove(pos).1)
    }

    fn check(&mut self, session: usize, trigger: Trigger, what: &str) -> Result<(), DbError> {
        if self.broken.contains(&session) {
            return Err(DbError::connection("connection already closed"));
        }
        match self.take_fault(trigger) {
            Some(Fault::Transient) => {
                self.broken.insert(session);
                Err(DbError::connection(format!(
                    "server closed the connection unexpectedly during {what}"
                )))
            }
            Some(Fault::Fatal) => Err(DbError::statement(format!(
                "permission denied during {what}"
            ))),
            None => Ok(()),
        }
    }
}

/// In-memory stand-in for PostgreSQL with scripted failures.
#[derive(Clone, Default)]
pub struct ScriptedDb {
    inner: Arc<Mutex<Backend>>,
}

impl ScriptedDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(self, trigger: Trigger, fault: Fault) -> Self {
        self.inner.lock().unwrap().faults.push((trigger, fault));
        self
    }

    pub fn connector(&self) -> ScriptedConnector {
        ScriptedConnector { db: self.clone() }
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Every statement sent, including ones that failed.
    pub fn executed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Execute(_, sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    fn connect(&self) -> Result<usize, DbError> {
        let mut backend = self.inner.lock().unwrap();
        backend.connects += 1;
        let n = backend.connects;
        if let Some(fault) = backend.take_fault(Trigger::Connect(n)) {
            backend.events.push(Event::ConnectFailed);
            return Err(match fault {
                Fault::Transient => {
                    DbError::connection("could not connect to server: Connection refused")
                }
                Fault::Fatal => {
                    DbError::statement("password authentication failed for user \"indexer\"")
                }
            });
        }
        backend.sessions += 1;
        let id = backend.sessions;
        backend.events.push(Event::Connect(id));
        Ok(id)
    }

    fn probe(&self, session: usize) -> Result<(), DbError> {
        let mut backend = self.inner.lock().unwrap();
        backend.probes += 1;
        let n = backend.probes;
        backend.events.push(Event::Probe(session));
        backend.check(session, Trigger::Probe(n), "SELECT 1")
    }

    fn execute(&self, session: usize, sql: &str) -> Result<(), DbError> {
        let mut backend = self.inner.lock().unwrap();
        backend.executes += 1;
        let n = backend.executes;
        backend.events.push(Event::Execute(session, sql.to_string()));
        backend.check(session, Trigger::Execute(n), sql)
    }

    fn close(&self, session: usize) {
        self.inner
            .lock()
            .unwrap()
            .events
            .push(Event::Close(session));
    }
}

pub struct ScriptedConnector {
    db: ScriptedDb,
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Session = ScriptedSession;

    fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: "db.test".to_string(),
            database: "bigdata".to_string(),
            user: "indexer".to_string(),
        }
    }

    async fn connect(&self) -> Result<ScriptedSession, DbError> {
        let id = self.db.connect()?;
        Ok(ScriptedSession {
            id,
            db: self.db.clone(),
        })
    }
}

pub struct ScriptedSession {
    id: usize,
    db: ScriptedDb,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn probe(&mut self) -> Result<(), DbError> {
        self.db.probe(self.id)
    }

    async fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        self.db.execute(self.id, sql)
    }

    async fn close(self) -> Result<(), DbError> {
        self.db.close(self.id);
        Ok(())
    }
}

pub fn statements_for(suffix: &str) -> Vec<String> {
    vec![
        format!("CREATE INDEX ON inrix.raw_data{suffix}(score);"),
        format!("CREATE INDEX ON inrix.raw_data{suffix}(tmc);"),
        format!("CREATE INDEX ON inrix.raw_data{suffix}(tx) WHERE score = 30;"),
    ]
}

/// Collects formatted `tracing` output for assertions.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Installs a plain-text INFO subscriber for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buf.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
