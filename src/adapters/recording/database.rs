//! Recording adapter for the `Connector` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::ConnectionSettings;
use crate::ports::{Connection, Connector};

/// Records connection and statement interactions while delegating to an
/// inner connector. The password is never recorded.
pub struct RecordingConnector {
    inner: Box<dyn Connector>,
    recorder: Arc<Mutex<CassetteRecorder>>,
    port: &'static str,
}

impl RecordingConnector {
    /// Wraps `inner`, recording under `port` (`postgres` or `mysql`).
    pub fn new(
        inner: Box<dyn Connector>,
        recorder: Arc<Mutex<CassetteRecorder>>,
        port: &'static str,
    ) -> Self {
        Self { inner, recorder, port }
    }
}

#[derive(Serialize)]
struct ConnectInput<'a> {
    dbname: &'a str,
    user: &'a str,
    host: &'a str,
    port: u16,
}

#[derive(Serialize)]
struct SqlInput<'a> {
    sql: &'a str,
}

impl Connector for RecordingConnector {
    fn connect(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn Connection>, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.connect(settings);
        let input = ConnectInput {
            dbname: &settings.dbname,
            user: &settings.user,
            host: &settings.host,
            port: settings.port,
        };
        record_result(&self.recorder, self.port, "connect", &input, &result.as_ref().map(|_| ()));
        let inner = result?;
        Ok(Box::new(RecordingConnection {
            inner,
            recorder: Arc::clone(&self.recorder),
            port: self.port,
        }))
    }
}

struct RecordingConnection {
    inner: Box<dyn Connection>,
    recorder: Arc<Mutex<CassetteRecorder>>,
    port: &'static str,
}

impl Connection for RecordingConnection {
    fn execute(&mut self, sql: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.execute(sql);
        record_result(&self.recorder, self.port, "execute", &SqlInput { sql }, &result);
        result
    }

    fn fetch_count(&mut self, sql: &str) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.fetch_count(sql);
        record_result(&self.recorder, self.port, "fetch_count", &SqlInput { sql }, &result);
        result
    }

    fn commit(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.commit();
        record_result(&self.recorder, self.port, "commit", &(), &result);
        result
    }

    fn close(self: Box<Self>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Self { inner, recorder, port } = *self;
        let result = inner.close();
        record_result(&recorder, port, "close", &(), &result);
        result
    }
}
