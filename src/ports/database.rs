//! Database port: opening connections and issuing single statements.

use crate::config::ConnectionSettings;

/// Opens connections to one database backend.
///
/// Abstracting the driver allows deterministic replay by recording and
/// replaying statement results during cassette playback.
pub trait Connector: Send + Sync {
    /// Opens a new connection with the given settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot establish the connection.
    fn connect(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn Connection>, Box<dyn std::error::Error + Send + Sync>>;
}

/// A live, exclusively owned connection.
///
/// Statements run strictly one after another; every call is a blocking
/// round trip.
pub trait Connection: Send {
    /// Executes a statement inside the connection's open transaction,
    /// starting one if none is open.
    ///
    /// # Errors
    ///
    /// Returns an error if the database rejects the statement.
    fn execute(&mut self, sql: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Runs a query and returns how many rows it produced.
    ///
    /// # Errors
    ///
    /// Returns an error if the database rejects the query.
    fn fetch_count(&mut self, sql: &str) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Commits the open transaction, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    fn commit(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver reports a failure while shutting down.
    fn close(self: Box<Self>) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
