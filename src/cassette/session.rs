//! Recording session managing per-port cassette recorders.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::recorder::CassetteRecorder;

/// Env var that turns on recording; its value is the output directory.
pub const RECORD_ENV: &str = "TABLEGATE_RECORD";

/// Holds one recorder per port, each writing `<port>.cassette.yaml` into
/// the session directory.
pub struct RecordingSession {
    /// Recorder for Postgres interactions.
    pub postgres: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for MySQL interactions.
    pub mysql: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for completion-token interactions.
    pub tokens: Arc<Mutex<CassetteRecorder>>,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Creates a session writing into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` already holds cassettes or cannot be created.
    pub fn at(dir: &Path) -> Result<Self, String> {
        let existing = dir.join("postgres.cassette.yaml");
        if existing.exists() {
            return Err(format!("Cassette directory already in use: {}", dir.display()));
        }
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create cassette directory {}: {e}", dir.display()))?;

        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let make_recorder = |port: &str| {
            let path = dir.join(format!("{port}.cassette.yaml"));
            Arc::new(Mutex::new(CassetteRecorder::new(path, format!("{stamp}-{port}"))))
        };

        Ok(Self {
            postgres: make_recorder("postgres"),
            mysql: make_recorder("mysql"),
            tokens: make_recorder("tokens"),
            output_dir: dir.to_path_buf(),
        })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes every port's cassette file and returns the session directory.
    ///
    /// All recording adapters must have been dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter still holds a recorder or a file
    /// cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        fn finish_one(arc: Arc<Mutex<CassetteRecorder>>, port: &str) -> Result<(), String> {
            let recorder = Arc::try_unwrap(arc)
                .map_err(|_| format!("Recording adapter for {port} still has references"))?
                .into_inner()
                .map_err(|e| format!("Recorder lock for {port} poisoned: {e}"))?;
            recorder.finish().map_err(|e| format!("Failed to write {port} cassette: {e}"))?;
            Ok(())
        }

        finish_one(self.postgres, "postgres")?;
        finish_one(self.mysql, "mysql")?;
        finish_one(self.tokens, "tokens")?;
        Ok(self.output_dir)
    }
}
