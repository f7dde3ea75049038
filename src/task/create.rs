//! Table provisioning.

use super::{write_token, DbmsTask};
use crate::config::DbmsConfig;
use crate::connection::ConnectionProvider;
use crate::context::ServiceContext;
use crate::error::TaskError;

/// A task that creates one table.
pub trait CreateTable: DbmsTask {
    /// Primary-key columns, in key order. Must not be empty.
    fn primary_key(&self) -> &[String];

    /// Column definitions for every field, including the key columns,
    /// e.g. `num integer, data varchar`.
    fn field_string(&self) -> String;

    /// The DDL statement this task issues.
    fn create_table_query(&self) -> String {
        format!(
            "CREATE TABLE {}({}, PRIMARY KEY ({}));",
            self.table_name(),
            self.field_string(),
            self.primary_key().join(",")
        )
    }
}

/// Issues a task's `CREATE TABLE` once and records completion.
///
/// There is no existence pre-check: running against a table that already
/// exists fails at the database and surfaces as
/// [`TaskError::TableCreation`].
pub struct TableCreator<'a> {
    task: &'a dyn CreateTable,
}

impl<'a> TableCreator<'a> {
    /// Wraps a task.
    #[must_use]
    pub fn new(task: &'a dyn CreateTable) -> Self {
        Self { task }
    }

    /// Executes and commits the DDL, closes the connection, then writes the
    /// completion token.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidTask`] for an empty primary key,
    /// connection and configuration errors from the provider,
    /// [`TaskError::TableCreation`] if the database rejects the statement,
    /// and [`TaskError::Token`] if the token cannot be written.
    pub fn run(&self, ctx: &ServiceContext, config: &DbmsConfig) -> Result<(), TaskError> {
        let task = self.task;
        if task.primary_key().is_empty() {
            let err = TaskError::InvalidTask(format!(
                "table {} must declare a primary key",
                task.table_name()
            ));
            tracing::warn!("{err}");
            return Err(err);
        }

        let statement = task.create_table_query();
        let backend = task.backend();
        let mut provider = ConnectionProvider::new(ctx.connector(backend), config, backend);

        let conn = provider.get_connection()?;
        tracing::info!(%backend, table = task.table_name(), "creating table");
        conn.execute(&statement).and_then(|()| conn.commit()).map_err(|e| {
            let err = TaskError::TableCreation { statement: statement.clone(), detail: e.to_string() };
            tracing::warn!("{err}");
            err
        })?;
        provider.release();

        write_token(ctx.tokens.as_ref(), task.output_token())
    }
}
