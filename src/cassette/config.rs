//! Cassette configuration for composable per-port replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Per-port cassette file paths. Ports without a cassette path panic if
/// called during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Path to the Postgres port cassette file.
    pub postgres: Option<PathBuf>,
    /// Path to the MySQL port cassette file.
    pub mysql: Option<PathBuf>,
    /// Path to the completion-token port cassette file.
    pub tokens: Option<PathBuf>,
}

/// Per-port replayers, each with its own interaction stream.
pub struct PortReplayers {
    /// Replayer for the Postgres port.
    pub postgres: Option<CassetteReplayer>,
    /// Replayer for the MySQL port.
    pub mysql: Option<CassetteReplayer>,
    /// Replayer for the completion-token port.
    pub tokens: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Returns a config where all port paths are `None`.
    #[must_use]
    pub fn panic_on_unspecified() -> Self {
        Self::default()
    }

    /// Reads and parses a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cassette(path: &Path) -> Result<Cassette, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }

    /// Loads a single cassette file and creates a replayer for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_port_cassette(path: &Path) -> Result<CassetteReplayer, String> {
        Self::load_cassette(path).map(|cassette| CassetteReplayer::new(&cassette))
    }

    /// Load all configured per-port cassette files and create replayers.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        Ok(PortReplayers {
            postgres: self.postgres.as_deref().map(Self::load_port_cassette).transpose()?,
            mysql: self.mysql.as_deref().map(Self::load_port_cassette).transpose()?,
            tokens: self.tokens.as_deref().map(Self::load_port_cassette).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::recorder::CassetteRecorder;
    use serde_json::json;

    #[test]
    fn load_per_port_cassettes() {
        let dir = tempfile::tempdir().unwrap();

        let pg_path = dir.path().join("postgres.cassette.yaml");
        let mut pg = CassetteRecorder::new(&pg_path, "pg");
        pg.record("postgres", "fetch_count", json!({"sql": "SELECT 1"}), json!({"ok": 1}));
        pg.finish().unwrap();

        let config = CassetteConfig { postgres: Some(pg_path), ..CassetteConfig::default() };
        let mut replayers = config.load_all().unwrap();

        let postgres = replayers.postgres.as_mut().unwrap();
        assert_eq!(postgres.next_interaction("postgres", "fetch_count").output, json!({"ok": 1}));
        assert!(replayers.mysql.is_none());
        assert!(replayers.tokens.is_none());
    }

    #[test]
    fn missing_cassette_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = CassetteConfig {
            tokens: Some(dir.path().join("nope.cassette.yaml")),
            ..CassetteConfig::default()
        };
        let err = config.load_all().err().unwrap();
        assert!(err.contains("Failed to read cassette file"));
    }

    #[test]
    fn load_all_with_no_cassettes() {
        let replayers = CassetteConfig::panic_on_unspecified().load_all().unwrap();
        assert!(replayers.postgres.is_none());
        assert!(replayers.mysql.is_none());
        assert!(replayers.tokens.is_none());
    }
}
