//! Connection configuration, one namespace per backend.
//!
//! The file is YAML with optional `postgres:` and `mysql:` sections:
//!
//! ```text
//! postgres:
//!   dbname: warehouse
//!   user: loader
//!   host: db.internal
//!   password: hunter2
//!   port: 5432
//! ```
//!
//! Any key may be overridden through `TABLEGATE_<NAMESPACE>_<KEY>`. Keys are
//! only required when a connection is requested, so a partial or absent file
//! loads fine.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Env var naming the config file when `--config` is not given.
pub const CONFIG_ENV: &str = "TABLEGATE_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "tablegate.yaml";

/// The database flavour a task talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// PostgreSQL, configured under `postgres`.
    Postgres,
    /// MySQL, configured under `mysql`.
    Mysql,
}

impl Backend {
    /// Configuration namespace (and cassette port name) for this backend.
    #[must_use]
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

/// Raw, possibly incomplete keys for one backend namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSection {
    /// Database name.
    pub dbname: Option<String>,
    /// Login user.
    pub user: Option<String>,
    /// Server host.
    pub host: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// Server port.
    pub port: Option<u16>,
}

/// Fully resolved connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Database name.
    pub dbname: String,
    /// Login user.
    pub user: String,
    /// Server host.
    pub host: String,
    /// Login password.
    pub password: String,
    /// Server port.
    pub port: u16,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbmsConfig {
    /// The `postgres` namespace.
    #[serde(default)]
    pub postgres: BackendSection,
    /// The `mysql` namespace.
    #[serde(default)]
    pub mysql: BackendSection,
}

impl DbmsConfig {
    /// Resolves the config file path: explicit flag, then `TABLEGATE_CONFIG`,
    /// then `tablegate.yaml` in the working directory.
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit.map_or_else(
            || env::var(CONFIG_ENV).map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from),
            Path::to_path_buf,
        )
    }

    /// Loads the file at `path` (empty config when it does not exist) and
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if an override holds an unparseable port.
    pub fn load(path: &Path) -> Result<Self, String> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
            Self::from_yaml(&content)
                .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using environment only");
            Self::default()
        };
        config.apply_overrides(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Parses a YAML document. An empty document yields an empty config.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed YAML.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Applies `TABLEGATE_<NAMESPACE>_<KEY>` overrides looked up through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a port override is not a valid port number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        for backend in [Backend::Postgres, Backend::Mysql] {
            let prefix = format!("TABLEGATE_{}_", backend.namespace().to_uppercase());
            let section = self.section_mut(backend);
            if let Some(v) = lookup(&format!("{prefix}DBNAME")) {
                section.dbname = Some(v);
            }
            if let Some(v) = lookup(&format!("{prefix}USER")) {
                section.user = Some(v);
            }
            if let Some(v) = lookup(&format!("{prefix}HOST")) {
                section.host = Some(v);
            }
            if let Some(v) = lookup(&format!("{prefix}PASSWORD")) {
                section.password = Some(v);
            }
            if let Some(v) = lookup(&format!("{prefix}PORT")) {
                let port = v
                    .trim()
                    .parse::<u16>()
                    .map_err(|e| format!("Invalid {prefix}PORT value {v:?}: {e}"))?;
                section.port = Some(port);
            }
        }
        Ok(())
    }

    /// Returns the raw section for `backend`.
    #[must_use]
    pub fn section(&self, backend: Backend) -> &BackendSection {
        match backend {
            Backend::Postgres => &self.postgres,
            Backend::Mysql => &self.mysql,
        }
    }

    fn section_mut(&mut self, backend: Backend) -> &mut BackendSection {
        match backend {
            Backend::Postgres => &mut self.postgres,
            Backend::Mysql => &mut self.mysql,
        }
    }

    /// Resolves every required key for `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::MissingConfig`] naming the first absent key.
    pub fn settings(&self, backend: Backend) -> Result<ConnectionSettings, TaskError> {
        let namespace = backend.namespace();
        let section = self.section(backend);
        let missing = |key: &'static str| TaskError::MissingConfig { namespace, key };
        Ok(ConnectionSettings {
            dbname: section.dbname.clone().ok_or_else(|| missing("dbname"))?,
            user: section.user.clone().ok_or_else(|| missing("user"))?,
            host: section.host.clone().ok_or_else(|| missing("host"))?,
            password: section.password.clone().ok_or_else(|| missing("password"))?,
            port: section.port.ok_or_else(|| missing("port"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const FULL: &str = "\
postgres:
  dbname: warehouse
  user: loader
  host: pg.internal
  password: secret
  port: 5432
mysql:
  dbname: mydb
  host: myhost
  port: 3306
  user: myuser
  password: my_password
";

    #[test]
    fn parses_both_namespaces() {
        let config = DbmsConfig::from_yaml(FULL).unwrap();
        let pg = config.settings(Backend::Postgres).unwrap();
        assert_eq!(pg.dbname, "warehouse");
        assert_eq!(pg.port, 5432);
        let my = config.settings(Backend::Mysql).unwrap();
        assert_eq!(my.host, "myhost");
        assert_eq!(my.user, "myuser");
    }

    #[test]
    fn missing_key_is_reported_at_resolution() {
        let config = DbmsConfig::from_yaml("postgres:\n  dbname: warehouse\n  user: loader\n").unwrap();
        let err = config.settings(Backend::Postgres).unwrap_err();
        assert!(matches!(err, TaskError::MissingConfig { namespace: "postgres", key: "host" }));
    }

    #[test]
    fn empty_document_loads_as_empty_config() {
        let config = DbmsConfig::from_yaml("  \n").unwrap();
        assert_eq!(config, DbmsConfig::default());
        assert!(config.settings(Backend::Mysql).is_err());
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut config = DbmsConfig::from_yaml(FULL).unwrap();
        let vars: HashMap<&str, &str> = [
            ("TABLEGATE_POSTGRES_PASSWORD", "rotated"),
            ("TABLEGATE_MYSQL_PORT", "3307"),
        ]
        .into_iter()
        .collect();
        config.apply_overrides(|name| vars.get(name).map(|v| (*v).to_string())).unwrap();

        assert_eq!(config.settings(Backend::Postgres).unwrap().password, "rotated");
        assert_eq!(config.settings(Backend::Mysql).unwrap().port, 3307);
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = DbmsConfig::default();
        let err = config
            .apply_overrides(|name| (name == "TABLEGATE_MYSQL_PORT").then(|| "nope".to_string()))
            .unwrap_err();
        assert!(err.contains("TABLEGATE_MYSQL_PORT"));
    }

    #[test]
    fn missing_file_yields_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DbmsConfig::load(&dir.path().join("absent.yaml")).is_ok());
    }

    #[test]
    fn debug_output_redacts_password() {
        let settings = DbmsConfig::from_yaml(FULL).unwrap().settings(Backend::Postgres).unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
