//! Post-load sanity verification.
//!
//! Verification runs two checks in order against a populated table:
//!
//! 1. An aggregate query must return at least `min_total_results` rows whose
//!    `non_null_fields` are all set. Failing this stops verification before
//!    any sampling query is issued.
//! 2. Each sentinel id is queried on its own; an id returning fewer than
//!    `result_length` rows counts as a failure. Verification fails only when
//!    the tally exceeds `failure_threshold`.
//!
//! The completion token is written after both checks pass and the
//! connection has been closed.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::{write_token, DbmsTask};
use crate::config::DbmsConfig;
use crate::connection::ConnectionProvider;
use crate::context::ServiceContext;
use crate::error::{SanityFailure, TaskError};

/// Default number of rows the aggregate check requires.
pub const DEFAULT_MIN_TOTAL_RESULTS: u64 = 100;
/// Default number of rows each sentinel id must return.
pub const DEFAULT_RESULT_LENGTH: u64 = 5;
/// Default number of sentinel ids allowed to under-return.
pub const DEFAULT_FAILURE_THRESHOLD: u64 = 2;

/// A task that verifies a loaded table.
pub trait SanityTest: DbmsTask {
    /// Column the sentinel ids are matched against.
    fn id_field(&self) -> &str;

    /// Sentinel ids to sample, in query order.
    fn ids(&self) -> &[String];

    /// Rows the aggregate check requires.
    fn min_total_results(&self) -> u64 {
        DEFAULT_MIN_TOTAL_RESULTS
    }

    /// Columns that must be non-null for a row to count in the aggregate check.
    fn non_null_fields(&self) -> &[String] {
        &[]
    }

    /// Rows each sentinel id must return.
    fn result_length(&self) -> u64 {
        DEFAULT_RESULT_LENGTH
    }

    /// Sentinel ids allowed to under-return before verification fails.
    fn failure_threshold(&self) -> u64 {
        DEFAULT_FAILURE_THRESHOLD
    }

    /// The aggregate query, e.g.
    /// `SELECT * FROM events WHERE a IS NOT NULL AND b IS NOT NULL LIMIT 100`.
    fn create_overall_query(&self) -> String {
        let where_clause = self
            .non_null_fields()
            .iter()
            .map(|field| format!("{field} IS NOT NULL"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let table = self.table_name();
        let limit = self.min_total_results();
        if where_clause.is_empty() {
            format!("SELECT * FROM {table} LIMIT {limit}")
        } else {
            format!("SELECT * FROM {table} WHERE {where_clause} LIMIT {limit}")
        }
    }

    /// The sampling query for one sentinel id. Single quotes inside the id
    /// are doubled.
    fn create_id_query(&self, id: &str) -> String {
        format!(
            "SELECT * FROM {} WHERE {} = '{}'",
            self.table_name(),
            self.id_field(),
            id.replace('\'', "''")
        )
    }
}

fn default_min_total_results() -> u64 {
    DEFAULT_MIN_TOTAL_RESULTS
}

fn default_result_length() -> u64 {
    DEFAULT_RESULT_LENGTH
}

fn default_failure_threshold() -> u64 {
    DEFAULT_FAILURE_THRESHOLD
}

/// Thresholds and sentinel ids for one verification task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityConfig {
    /// Rows the aggregate check requires.
    #[serde(default = "default_min_total_results")]
    pub min_total_results: u64,
    /// Columns that must be non-null in the aggregate check.
    #[serde(default)]
    pub non_null_fields: Vec<String>,
    /// Rows each sentinel id must return.
    #[serde(default = "default_result_length")]
    pub result_length: u64,
    /// Sentinel ids allowed to under-return.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u64,
    /// Column the sentinel ids are matched against.
    pub id_field: String,
    /// Sentinel ids, in query order. Numbers are accepted and kept verbatim.
    #[serde(default, deserialize_with = "scalars_as_strings")]
    pub sentinel_ids: Vec<String>,
}

impl SanityConfig {
    /// A config with default thresholds.
    pub fn new(id_field: impl Into<String>, sentinel_ids: Vec<String>) -> Self {
        Self {
            min_total_results: DEFAULT_MIN_TOTAL_RESULTS,
            non_null_fields: Vec::new(),
            result_length: DEFAULT_RESULT_LENGTH,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            id_field: id_field.into(),
            sentinel_ids,
        }
    }
}

fn scalars_as_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<serde_yaml::Value>::deserialize(deserializer)?
        .into_iter()
        .map(|value| match value {
            serde_yaml::Value::String(s) => Ok(s),
            serde_yaml::Value::Number(n) => Ok(n.to_string()),
            serde_yaml::Value::Bool(b) => Ok(b.to_string()),
            other => Err(D::Error::custom(format!("sentinel id must be a scalar, got {other:?}"))),
        })
        .collect()
}

/// One sentinel id that returned too few rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    /// The sentinel id.
    pub id: String,
    /// Rows it returned.
    pub returned: u64,
}

/// Counts gathered by one verification pass. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Table that was verified.
    pub table: String,
    /// Rows returned by the aggregate query (capped by its `LIMIT`).
    pub observed_rows: u64,
    /// Rows the aggregate check required.
    pub expected_rows: u64,
    /// Number of sentinel ids sampled.
    pub sampled: u64,
    /// Sentinel ids that under-returned.
    pub shortfalls: Vec<Shortfall>,
    /// Tolerated number of shortfalls.
    pub failure_threshold: u64,
}

impl VerificationResult {
    /// Number of sampled ids that under-returned.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.shortfalls.len() as u64
    }
}

/// Runs both sanity checks for a task and records completion on success.
pub struct SanityVerifier<'a> {
    task: &'a dyn SanityTest,
}

impl<'a> SanityVerifier<'a> {
    /// Wraps a task.
    #[must_use]
    pub fn new(task: &'a dyn SanityTest) -> Self {
        Self { task }
    }

    /// Runs the aggregate check, then the sampling check, then closes the
    /// connection and writes the completion token.
    ///
    /// The connection is closed on every path, including failures.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::SanityCheck`] when either check fails, connection
    /// and configuration errors from the provider, [`TaskError::Query`] when
    /// a query is rejected, and [`TaskError::Token`] if the token cannot be
    /// written. The token is never written on error.
    pub fn run(
        &self,
        ctx: &ServiceContext,
        config: &DbmsConfig,
    ) -> Result<VerificationResult, TaskError> {
        let backend = self.task.backend();
        let mut provider = ConnectionProvider::new(ctx.connector(backend), config, backend);

        let result = self.verify(&mut provider);
        provider.release();
        let result = result?;

        tracing::info!(
            table = %result.table,
            observed = result.observed_rows,
            sampled = result.sampled,
            failures = result.failures(),
            "sanity check passed"
        );
        write_token(ctx.tokens.as_ref(), self.task.output_token())?;
        Ok(result)
    }

    /// Runs both checks over `provider`'s connection without touching the
    /// token store.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn verify(
        &self,
        provider: &mut ConnectionProvider<'_>,
    ) -> Result<VerificationResult, TaskError> {
        let task = self.task;
        let table = task.table_name().to_string();

        let expected_rows = task.min_total_results();
        let observed_rows = fetch_count(provider, &task.create_overall_query())?;
        if observed_rows < expected_rows {
            let failure =
                SanityFailure::InsufficientRows { table, observed: observed_rows, expected: expected_rows };
            tracing::warn!("{failure}");
            return Err(failure.into());
        }

        let shortfalls = self.sample_ids(provider)?;
        let result = VerificationResult {
            table,
            observed_rows,
            expected_rows,
            sampled: task.ids().len() as u64,
            shortfalls,
            failure_threshold: task.failure_threshold(),
        };

        let failures = result.failures();
        if failures > result.failure_threshold {
            let failure = SanityFailure::SampledIdsShort {
                failures,
                table: result.table,
                threshold: result.failure_threshold,
                sampled: result.sampled,
            };
            tracing::warn!("{failure}");
            return Err(failure.into());
        }
        Ok(result)
    }

    fn sample_ids(&self, provider: &mut ConnectionProvider<'_>) -> Result<Vec<Shortfall>, TaskError> {
        let task = self.task;
        let required = task.result_length();
        let mut shortfalls = Vec::new();
        for id in task.ids() {
            let returned = fetch_count(provider, &task.create_id_query(id))?;
            if returned < required {
                tracing::info!("Id {id} only returned {returned} results.");
                shortfalls.push(Shortfall { id: id.clone(), returned });
            }
        }
        Ok(shortfalls)
    }
}

fn fetch_count(provider: &mut ConnectionProvider<'_>, statement: &str) -> Result<u64, TaskError> {
    provider.get_connection()?.fetch_count(statement).map_err(|e| {
        let err = TaskError::Query { statement: statement.to_string(), detail: e.to_string() };
        tracing::warn!("{err}");
        err
    })
}
