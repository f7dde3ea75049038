//! Task definition files.
//!
//! A definition is a YAML document tagged with `kind`:
//!
//! ```text
//! kind: create_table
//! backend: postgres
//! output_token: /var/run/tokens/events.created
//! table:
//!   name: events
//!   fields:
//!     - {name: id, type: integer}
//!     - {name: data, type: varchar}
//!   primary_key: [id]
//! ```
//!
//! ```text
//! kind: sanity_test
//! backend: postgres
//! table: events
//! output_token: /var/run/tokens/events.verified
//! id_field: id
//! sentinel_ids: [17, 42]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{CreateTable, DbmsTask, SanityConfig, SanityTest, TableSpec};
use crate::config::Backend;
use crate::error::TaskError;

/// Creates the table described by `table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTableTask {
    /// Backend to provision on.
    pub backend: Backend,
    /// Token written once the table exists.
    pub output_token: String,
    /// Table shape.
    pub table: TableSpec,
}

impl DbmsTask for CreateTableTask {
    fn table_name(&self) -> &str {
        &self.table.name
    }

    fn output_token(&self) -> &str {
        &self.output_token
    }

    fn backend(&self) -> Backend {
        self.backend
    }
}

impl CreateTable for CreateTableTask {
    fn primary_key(&self) -> &[String] {
        &self.table.primary_key
    }

    fn field_string(&self) -> String {
        self.table.field_string()
    }
}

/// Verifies an already-loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityTestTask {
    /// Backend the table lives on.
    pub backend: Backend,
    /// Table to verify.
    pub table: String,
    /// Token written once verification passes.
    pub output_token: String,
    /// Thresholds and sentinel ids.
    #[serde(flatten)]
    pub sanity: SanityConfig,
}

impl DbmsTask for SanityTestTask {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn output_token(&self) -> &str {
        &self.output_token
    }

    fn backend(&self) -> Backend {
        self.backend
    }
}

impl SanityTest for SanityTestTask {
    fn id_field(&self) -> &str {
        &self.sanity.id_field
    }

    fn ids(&self) -> &[String] {
        &self.sanity.sentinel_ids
    }

    fn min_total_results(&self) -> u64 {
        self.sanity.min_total_results
    }

    fn non_null_fields(&self) -> &[String] {
        &self.sanity.non_null_fields
    }

    fn result_length(&self) -> u64 {
        self.sanity.result_length
    }

    fn failure_threshold(&self) -> u64 {
        self.sanity.failure_threshold
    }
}

/// Any task a definition file can describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskDefinition {
    /// Provision a table.
    CreateTable(CreateTableTask),
    /// Verify a loaded table.
    SanityTest(SanityTestTask),
}

impl TaskDefinition {
    /// Reads and validates a definition file.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidTask`] if the file cannot be read, parsed,
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self, TaskError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TaskError::InvalidTask(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
            .map_err(|e| TaskError::InvalidTask(format!("{}: {e}", path.display())))
    }

    /// Parses and validates a definition.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidTask`] on malformed YAML or an unusable
    /// definition.
    pub fn from_yaml(content: &str) -> Result<Self, TaskError> {
        let definition: Self =
            serde_yaml::from_str(content).map_err(|e| TaskError::InvalidTask(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    fn validate(&self) -> Result<(), TaskError> {
        if self.task().output_token().trim().is_empty() {
            return Err(TaskError::InvalidTask("output_token must not be empty".into()));
        }
        match self {
            Self::CreateTable(task) => task.table.validate(),
            Self::SanityTest(task) => {
                if task.table.trim().is_empty() {
                    return Err(TaskError::InvalidTask("table must not be empty".into()));
                }
                if task.sanity.id_field.trim().is_empty() {
                    return Err(TaskError::InvalidTask("id_field must not be empty".into()));
                }
                Ok(())
            }
        }
    }

    /// The shared task accessors.
    #[must_use]
    pub fn task(&self) -> &dyn DbmsTask {
        match self {
            Self::CreateTable(task) => task,
            Self::SanityTest(task) => task,
        }
    }

    /// `kind` tag as written in the file.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateTable(_) => "create_table",
            Self::SanityTest(_) => "sanity_test",
        }
    }
}
