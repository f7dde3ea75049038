//! Completion-token port.

/// Stores write-once completion markers keyed by path.
///
/// A token's existence means the step it names already succeeded; tokens
/// carry no payload.
pub trait TokenStore: Send + Sync {
    /// Returns `true` if the token has been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried (unsupported scheme,
    /// permissions, etc.).
    fn exists(&self, token: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// Creates the token. Writing an existing token succeeds without change.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be created.
    fn write(&self, token: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
