//! Task contracts shared by table provisioning and sanity verification.
//!
//! A task instance describes one table on one backend and the completion
//! token that marks it done. Concrete tasks implement [`DbmsTask`] plus
//! either [`CreateTable`] or [`SanityTest`]; the runners in [`create`] and
//! [`sanity`] drive them.

pub mod create;
pub mod definition;
pub mod sanity;
pub mod table;

pub use create::{CreateTable, TableCreator};
pub use definition::{CreateTableTask, SanityTestTask, TaskDefinition};
pub use sanity::{SanityConfig, SanityTest, SanityVerifier, VerificationResult};
pub use table::{FieldDef, TableSpec};

use crate::config::Backend;
use crate::error::TaskError;
use crate::ports::TokenStore;

/// Accessors every database task supplies.
pub trait DbmsTask {
    /// Name of the table the task operates on.
    fn table_name(&self) -> &str;

    /// Token written when the task succeeds.
    fn output_token(&self) -> &str;

    /// Backend whose configuration namespace and driver the task uses.
    fn backend(&self) -> Backend;

    /// Returns `true` if the completion token already exists.
    ///
    /// This is the scheduler-side guard: runners never consult it
    /// themselves.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Token`] if the store cannot be queried.
    fn complete(&self, tokens: &dyn TokenStore) -> Result<bool, TaskError> {
        let token = self.output_token();
        tokens
            .exists(token)
            .map_err(|e| TaskError::Token { token: token.to_string(), detail: e.to_string() })
    }
}

/// Writes the completion token, mapping store failures into [`TaskError`].
pub(crate) fn write_token(tokens: &dyn TokenStore, token: &str) -> Result<(), TaskError> {
    tokens.write(token).map_err(|e| {
        let err = TaskError::Token { token: token.to_string(), detail: e.to_string() };
        tracing::warn!("{err}");
        err
    })?;
    tracing::info!(%token, "completion token written");
    Ok(())
}
