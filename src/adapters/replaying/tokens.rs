//! Replaying adapter for the `TokenStore` port.

use std::sync::Mutex;

use super::extract_result;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::TokenStore;

/// Replays recorded token interactions from a cassette.
pub struct ReplayingTokenStore {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingTokenStore {
    /// Creates a new replaying store from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn next_output(&self, method: &str) -> serde_json::Value {
        let mut replayer = self.replayer.lock().expect("replayer lock poisoned");
        replayer.next_interaction("tokens", method).output.clone()
    }
}

impl TokenStore for ReplayingTokenStore {
    fn exists(&self, _token: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        extract_result(&self.next_output("exists"), "tokens::exists")
    }

    fn write(&self, _token: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        extract_result(&self.next_output("write"), "tokens::write")
    }
}
