//! Declared table shape.

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// One column: name plus a backend-specific type fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Column name.
    pub name: String,
    /// Column type as the backend spells it (e.g. `integer`, `varchar(64)`).
    #[serde(rename = "type")]
    pub sql_type: String,
}

impl FieldDef {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self { name: name.into(), sql_type: sql_type.into() }
    }
}

/// Name, ordered columns, and primary key of a table to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub fields: Vec<FieldDef>,
    /// Primary-key columns in key order.
    pub primary_key: Vec<String>,
}

impl TableSpec {
    /// Builds a validated spec.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldDef>,
        primary_key: Vec<String>,
    ) -> Result<Self, TaskError> {
        let spec = Self { name: name.into(), fields, primary_key };
        spec.validate()?;
        Ok(spec)
    }

    /// Checks that the name, fields and primary key are usable.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidTask`] if the name or field list is empty,
    /// the primary key is empty, or a key column is not a declared field.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.name.trim().is_empty() {
            return Err(TaskError::InvalidTask("table name must not be empty".into()));
        }
        if self.fields.is_empty() {
            return Err(TaskError::InvalidTask(format!("table {} declares no fields", self.name)));
        }
        if self.primary_key.is_empty() {
            return Err(TaskError::InvalidTask(format!(
                "table {} must declare a primary key",
                self.name
            )));
        }
        if let Some(key) =
            self.primary_key.iter().find(|key| !self.fields.iter().any(|f| &f.name == *key))
        {
            return Err(TaskError::InvalidTask(format!(
                "primary key column {key} is not a field of table {}",
                self.name
            )));
        }
        Ok(())
    }

    /// Column-definition fragment, e.g. `id integer, data varchar`.
    #[must_use]
    pub fn field_string(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{} {}", f.name, f.sql_type))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
