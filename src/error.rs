//! Error taxonomy for provisioning and verification runs.

use thiserror::Error;

/// Why a sanity check rejected a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanityFailure {
    /// The aggregate query returned fewer qualifying rows than required.
    #[error(
        "Sanity check failed: only found {observed} / {expected} expected results in table {table}"
    )]
    InsufficientRows {
        /// Table that was checked.
        table: String,
        /// Rows returned by the aggregate query.
        observed: u64,
        /// `min_total_results` for the task.
        expected: u64,
    },
    /// More sentinel ids under-returned than the failure threshold tolerates.
    #[error(
        "Sanity check failed: {failures} ids in {table} failed to return sufficient results \
         (threshold {threshold}, sampled {sampled})"
    )]
    SampledIdsShort {
        /// Table that was checked.
        table: String,
        /// Number of sentinel ids that returned fewer than `result_length` rows.
        failures: u64,
        /// `failure_threshold` for the task.
        threshold: u64,
        /// Number of sentinel ids sampled.
        sampled: u64,
    },
}

/// Errors raised by a task run. None of them are retried internally.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The backend connect call failed.
    #[error("Unable to connect to database {dbname}")]
    Connection {
        /// Target database name.
        dbname: String,
        /// Flattened driver message.
        detail: String,
    },

    /// A required connection key is absent from the backend namespace.
    #[error("missing configuration key {namespace}.{key}")]
    MissingConfig {
        /// Backend namespace (`postgres` or `mysql`).
        namespace: &'static str,
        /// The absent key.
        key: &'static str,
    },

    /// The task definition is malformed.
    #[error("invalid task definition: {0}")]
    InvalidTask(String),

    /// The database rejected the DDL statement.
    #[error("table creation failed for `{statement}`: {detail}")]
    TableCreation {
        /// The statement that was rejected.
        statement: String,
        /// Flattened driver message.
        detail: String,
    },

    /// A verification query failed at the driver.
    #[error("query failed for `{statement}`: {detail}")]
    Query {
        /// The statement that failed.
        statement: String,
        /// Flattened driver message.
        detail: String,
    },

    /// The table did not pass verification.
    #[error(transparent)]
    SanityCheck(#[from] SanityFailure),

    /// The completion-token store failed.
    #[error("completion token {token}: {detail}")]
    Token {
        /// Token path.
        token: String,
        /// Flattened store message.
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_names_database_only() {
        let err = TaskError::Connection {
            dbname: "warehouse".into(),
            detail: "pool timed out while waiting for an open connection".into(),
        };
        assert_eq!(err.to_string(), "Unable to connect to database warehouse");
    }

    #[test]
    fn insufficient_rows_message_reports_counts_and_table() {
        let err = TaskError::from(SanityFailure::InsufficientRows {
            table: "events".into(),
            observed: 3,
            expected: 100,
        });
        assert_eq!(
            err.to_string(),
            "Sanity check failed: only found 3 / 100 expected results in table events"
        );
    }

    #[test]
    fn sampled_ids_message_reports_tally() {
        let failure = SanityFailure::SampledIdsShort {
            table: "events".into(),
            failures: 3,
            threshold: 2,
            sampled: 4,
        };
        let msg = failure.to_string();
        assert!(msg.starts_with("Sanity check failed: 3 ids in events"));
        assert!(msg.contains("threshold 2"));
    }
}
