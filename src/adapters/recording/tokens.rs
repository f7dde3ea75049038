//! Recording adapter for the `TokenStore` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::TokenStore;

/// Records token interactions while delegating to an inner store.
pub struct RecordingTokenStore {
    inner: Box<dyn TokenStore>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingTokenStore {
    /// Creates a recording store wrapping the given implementation.
    pub fn new(inner: Box<dyn TokenStore>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct TokenInput<'a> {
    token: &'a str,
}

impl TokenStore for RecordingTokenStore {
    fn exists(&self, token: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.exists(token);
        record_result(&self.recorder, "tokens", "exists", &TokenInput { token }, &result);
        result
    }

    fn write(&self, token: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.write(token);
        record_result(&self.recorder, "tokens", "write", &TokenInput { token }, &result);
        result
    }
}
