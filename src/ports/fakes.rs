//! In-memory port implementations for unit tests.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use super::{Connection, Connector, TokenStore};
use crate::config::ConnectionSettings;

/// Shared state behind a [`FakeConnector`] and every connection it opens.
#[derive(Debug, Default)]
pub(crate) struct FakeDb {
    /// Row count returned per exact query text.
    pub counts: HashMap<String, u64>,
    /// Row count for queries not listed in `counts`.
    pub default_count: u64,
    /// When set, `connect` fails with this message.
    pub connect_error: Option<String>,
    /// When set, `execute` fails with this message.
    pub execute_error: Option<String>,
    /// Every call made against the fake, in order.
    pub log: Vec<String>,
}

/// Connector whose connections answer from a [`FakeDb`].
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    pub db: Arc<Mutex<FakeDb>>,
}

impl FakeConnector {
    pub fn with_counts<I>(default_count: u64, counts: I) -> Self
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        let db = FakeDb { counts: counts.into_iter().collect(), default_count, ..FakeDb::default() };
        Self { db: Arc::new(Mutex::new(db)) }
    }

    pub fn log(&self) -> Vec<String> {
        self.db.lock().unwrap().log.clone()
    }

    /// Token store whose writes land in this connector's log as `token <path>`.
    pub fn token_store(&self) -> MemTokenStore {
        MemTokenStore { log: Some(Arc::clone(&self.db)), ..MemTokenStore::default() }
    }
}

impl Connector for FakeConnector {
    fn connect(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn Connection>, Box<dyn std::error::Error + Send + Sync>> {
        let mut db = self.db.lock().unwrap();
        db.log.push(format!("connect {}", settings.dbname));
        if let Some(msg) = &db.connect_error {
            return Err(msg.clone().into());
        }
        Ok(Box::new(FakeConnection { db: Arc::clone(&self.db) }))
    }
}

struct FakeConnection {
    db: Arc<Mutex<FakeDb>>,
}

impl Connection for FakeConnection {
    fn execute(&mut self, sql: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut db = self.db.lock().unwrap();
        db.log.push(format!("execute {sql}"));
        match &db.execute_error {
            Some(msg) => Err(msg.clone().into()),
            None => Ok(()),
        }
    }

    fn fetch_count(&mut self, sql: &str) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let mut db = self.db.lock().unwrap();
        db.log.push(format!("fetch {sql}"));
        Ok(db.counts.get(sql).copied().unwrap_or(db.default_count))
    }

    fn commit(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.db.lock().unwrap().log.push("commit".to_string());
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.db.lock().unwrap().log.push("close".to_string());
        Ok(())
    }
}

/// Token store backed by a set of written paths.
#[derive(Default)]
pub(crate) struct MemTokenStore {
    pub written: Mutex<HashSet<String>>,
    log: Option<Arc<Mutex<FakeDb>>>,
}

impl MemTokenStore {
    pub fn contains(&self, token: &str) -> bool {
        self.written.lock().unwrap().contains(token)
    }
}

impl TokenStore for MemTokenStore {
    fn exists(&self, token: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.contains(token))
    }

    fn write(&self, token: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(db) = &self.log {
            db.lock().unwrap().log.push(format!("token {token}"));
        }
        self.written.lock().unwrap().insert(token.to_string());
        Ok(())
    }
}

struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a thread-local subscriber and returns what it logged.
pub(crate) fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&buf);
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || CapturedWriter(Arc::clone(&sink)))
        .with_ansi(false)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buf.lock().unwrap()).into_owned();
    (out, logs)
}
