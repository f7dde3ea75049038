//! Lazily opened, per-run database connection.

use crate::config::{Backend, DbmsConfig};
use crate::error::TaskError;
use crate::ports::{Connection, Connector};

/// Owns at most one connection for the duration of a task run.
///
/// The connection is opened on the first [`get_connection`](Self::get_connection)
/// call and reused afterwards. It is closed by [`release`](Self::release), or
/// on drop if the run bailed out before releasing it.
pub struct ConnectionProvider<'a> {
    connector: &'a dyn Connector,
    config: &'a DbmsConfig,
    backend: Backend,
    conn: Option<Box<dyn Connection>>,
    dbname: Option<String>,
}

impl<'a> ConnectionProvider<'a> {
    /// Creates a provider; nothing is resolved or opened yet.
    #[must_use]
    pub fn new(connector: &'a dyn Connector, config: &'a DbmsConfig, backend: Backend) -> Self {
        Self { connector, config, backend, conn: None, dbname: None }
    }

    /// Returns the cached connection, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::MissingConfig`] when the backend namespace is
    /// incomplete, or [`TaskError::Connection`] when the driver refuses.
    pub fn get_connection(&mut self) -> Result<&mut dyn Connection, TaskError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.open()?,
        };
        Ok(&mut **self.conn.insert(conn))
    }

    /// Returns `true` while a connection is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn open(&mut self) -> Result<Box<dyn Connection>, TaskError> {
        let settings = self.config.settings(self.backend).inspect_err(|err| {
            tracing::warn!(backend = %self.backend, "{err}");
        })?;
        tracing::debug!(
            backend = %self.backend,
            dbname = %settings.dbname,
            host = %settings.host,
            port = settings.port,
            "opening connection"
        );
        let conn = self.connector.connect(&settings).map_err(|e| {
            let err = TaskError::Connection { dbname: settings.dbname.clone(), detail: e.to_string() };
            tracing::warn!(detail = %e, "{err}");
            err
        })?;
        self.dbname = Some(settings.dbname);
        Ok(conn)
    }

    /// Closes the connection if one is open. Calling it again is a no-op.
    ///
    /// A failure while closing is logged, not returned.
    pub fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            let dbname = self.dbname.as_deref().unwrap_or("<unknown>");
            match conn.close() {
                Ok(()) => tracing::debug!(backend = %self.backend, %dbname, "connection closed"),
                Err(e) => {
                    tracing::warn!(backend = %self.backend, %dbname, "failed to close connection: {e}");
                }
            }
        }
    }
}

impl Drop for ConnectionProvider<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
