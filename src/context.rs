//! Service context bundling all port trait objects.

use std::path::{Path, PathBuf};

use crate::adapters::live::{LiveMySqlConnector, LivePostgresConnector, LiveTokenStore};
use crate::adapters::recording::{RecordingConnector, RecordingTokenStore};
use crate::adapters::replaying::{ReplayingConnector, ReplayingTokenStore};
use crate::cassette::config::CassetteConfig;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::{Backend, ConnectionSettings};
use crate::ports::{Connection, Connector, TokenStore};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, replaying, recording).
pub struct ServiceContext {
    /// Connector for the `postgres` backend.
    pub postgres: Box<dyn Connector>,
    /// Connector for the `mysql` backend.
    pub mysql: Box<dyn Connector>,
    /// Completion-token store.
    pub tokens: Box<dyn TokenStore>,
}

impl ServiceContext {
    /// Creates a live context backed by sqlx, with tokens on the local
    /// filesystem or S3.
    #[must_use]
    pub fn live() -> Self {
        Self {
            postgres: Box::new(LivePostgresConnector),
            mysql: Box::new(LiveMySqlConnector),
            tokens: Box::new(LiveTokenStore),
        }
    }

    /// Creates a live context whose interactions are captured by `session`.
    #[must_use]
    pub fn recording(session: &RecordingSession) -> Self {
        Self {
            postgres: Box::new(RecordingConnector::new(
                Box::new(LivePostgresConnector),
                session.postgres.clone(),
                "postgres",
            )),
            mysql: Box::new(RecordingConnector::new(
                Box::new(LiveMySqlConnector),
                session.mysql.clone(),
                "mysql",
            )),
            tokens: Box::new(RecordingTokenStore::new(
                Box::new(LiveTokenStore),
                session.tokens.clone(),
            )),
        }
    }

    /// Opens a recording session in `dir` and a context wired to it.
    ///
    /// Drop the context before calling [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be prepared.
    pub fn recording_at(dir: PathBuf) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::at(&dir)?;
        Ok((Self::recording(&session), session))
    }

    /// Creates a replaying context from a monolithic cassette file.
    ///
    /// Every port gets its own replayer over the same cassette, so per-port
    /// cursors are independent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = CassetteConfig::load_cassette(path)?;
        Ok(Self {
            postgres: Box::new(ReplayingConnector::new(CassetteReplayer::new(&cassette), "postgres")),
            mysql: Box::new(ReplayingConnector::new(CassetteReplayer::new(&cassette), "mysql")),
            tokens: Box::new(ReplayingTokenStore::new(CassetteReplayer::new(&cassette))),
        })
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// Ports without a configured cassette use an adapter that panics with
    /// a clear message when called.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;

        Ok(Self {
            postgres: match replayers.postgres {
                Some(r) => Box::new(ReplayingConnector::new(r, "postgres")),
                None => Box::new(PanickingConnector("postgres")),
            },
            mysql: match replayers.mysql {
                Some(r) => Box::new(ReplayingConnector::new(r, "mysql")),
                None => Box::new(PanickingConnector("mysql")),
            },
            tokens: match replayers.tokens {
                Some(r) => Box::new(ReplayingTokenStore::new(r)),
                None => Box::new(PanickingTokenStore),
            },
        })
    }

    /// The connector serving `backend`.
    #[must_use]
    pub fn connector(&self, backend: Backend) -> &dyn Connector {
        match backend {
            Backend::Postgres => self.postgres.as_ref(),
            Backend::Mysql => self.mysql.as_ref(),
        }
    }
}

// --- Panicking adapters for unspecified ports ---

struct PanickingConnector(&'static str);
impl Connector for PanickingConnector {
    fn connect(
        &self,
        _settings: &ConnectionSettings,
    ) -> Result<Box<dyn Connection>, Box<dyn std::error::Error + Send + Sync>> {
        panic!("{} port not configured in CassetteConfig, no cassette loaded", self.0);
    }
}

struct PanickingTokenStore;
impl TokenStore for PanickingTokenStore {
    fn exists(&self, _token: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        panic!("tokens port not configured in CassetteConfig, no cassette loaded");
    }
    fn write(&self, _token: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        panic!("tokens port not configured in CassetteConfig, no cassette loaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, port: &str, method: &str, output: serde_json::Value) -> Interaction {
        Interaction { seq, port: port.into(), method: method.into(), input: json!({}), output }
    }

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let cassette = Cassette { name: "test".into(), recorded_at: Utc::now(), interactions };
        std::fs::write(path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
    }

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            dbname: "mydb".into(),
            user: "u".into(),
            host: "h".into(),
            password: "p".into(),
            port: 5432,
        }
    }

    #[test]
    fn replaying_context_from_monolithic_cassette() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full.cassette.yaml");
        write_cassette(
            &path,
            vec![
                interaction(0, "tokens", "exists", json!({"ok": true})),
                interaction(1, "postgres", "connect", json!({"ok": null})),
                interaction(2, "postgres", "fetch_count", json!({"ok": 3})),
            ],
        );

        let ctx = ServiceContext::replaying(&path).unwrap();
        assert!(ctx.tokens.exists("/t").unwrap());
        let mut conn = ctx.connector(Backend::Postgres).connect(&settings()).unwrap();
        assert_eq!(conn.fetch_count("SELECT 1").unwrap(), 3);
    }

    #[test]
    fn replaying_from_per_port_cassettes() {
        let dir = tempfile::tempdir().unwrap();
        let tokens_path = dir.path().join("tokens.cassette.yaml");
        write_cassette(&tokens_path, vec![interaction(0, "tokens", "exists", json!({"ok": false}))]);

        let config = CassetteConfig { tokens: Some(tokens_path), ..CassetteConfig::default() };
        let ctx = ServiceContext::replaying_from(&config).unwrap();
        assert!(!ctx.tokens.exists("/t").unwrap());
    }

    #[test]
    #[should_panic(expected = "not configured in CassetteConfig")]
    fn unspecified_port_panics_with_clear_message() {
        let ctx = ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified()).unwrap();
        let _ = ctx.connector(Backend::Mysql).connect(&settings());
    }

    #[test]
    fn recording_at_rejects_used_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("postgres.cassette.yaml"), "").unwrap();
        assert!(ServiceContext::recording_at(dir.path().to_path_buf()).is_err());
    }
}
