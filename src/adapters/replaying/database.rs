//! Replaying adapter for the `Connector` port.

use std::sync::{Arc, Mutex};

use super::extract_result;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::ConnectionSettings;
use crate::ports::{Connection, Connector};

/// Replays recorded connection and statement results from a cassette.
///
/// Connections opened by this connector share its replayer, so a cassette
/// covers any number of connect/close cycles in order.
pub struct ReplayingConnector {
    replayer: Arc<Mutex<CassetteReplayer>>,
    port: &'static str,
}

impl ReplayingConnector {
    /// Creates a replaying connector serving interactions recorded under `port`.
    #[must_use]
    pub fn new(replayer: CassetteReplayer, port: &'static str) -> Self {
        Self { replayer: Arc::new(Mutex::new(replayer)), port }
    }
}

fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let mut replayer = replayer.lock().expect("replayer lock poisoned");
    replayer.next_interaction(port, method).output.clone()
}

impl Connector for ReplayingConnector {
    fn connect(
        &self,
        _settings: &ConnectionSettings,
    ) -> Result<Box<dyn Connection>, Box<dyn std::error::Error + Send + Sync>> {
        let output = next_output(&self.replayer, self.port, "connect");
        extract_result::<()>(&output, "connect")?;
        Ok(Box::new(ReplayingConnection { replayer: Arc::clone(&self.replayer), port: self.port }))
    }
}

struct ReplayingConnection {
    replayer: Arc<Mutex<CassetteReplayer>>,
    port: &'static str,
}

impl Connection for ReplayingConnection {
    fn execute(&mut self, _sql: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        extract_result(&next_output(&self.replayer, self.port, "execute"), "execute")
    }

    fn fetch_count(&mut self, _sql: &str) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        extract_result(&next_output(&self.replayer, self.port, "fetch_count"), "fetch_count")
    }

    fn commit(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        extract_result(&next_output(&self.replayer, self.port, "commit"), "commit")
    }

    fn close(self: Box<Self>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        extract_result(&next_output(&self.replayer, self.port, "close"), "close")
    }
}
