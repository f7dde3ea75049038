//! `tablegate verify` command.

use std::path::Path;

use super::{load_config, load_task};
use crate::context::ServiceContext;
use crate::task::{DbmsTask, SanityVerifier, TaskDefinition, VerificationResult};

/// Execute the `verify` command against `ctx`.
///
/// Skips the task when its completion token already exists, otherwise
/// runs both sanity checks and prints a summary.
///
/// # Errors
///
/// Returns an error string if the task file is not a `sanity_test` task,
/// the config cannot be loaded, or a check fails.
pub fn run_with_context(
    ctx: &ServiceContext,
    config_path: Option<&Path>,
    task_path: &Path,
) -> Result<(), String> {
    let TaskDefinition::SanityTest(task) = load_task(task_path)? else {
        return Err(format!("{} is not a sanity_test task", task_path.display()));
    };

    if task.complete(ctx.tokens.as_ref()).map_err(|e| e.to_string())? {
        println!("Sanity test for {} already complete ({})", task.table_name(), task.output_token());
        return Ok(());
    }

    let config = load_config(config_path)?;
    let result = SanityVerifier::new(&task).run(ctx, &config).map_err(|e| e.to_string())?;
    println!("{}", summary(&result));
    Ok(())
}

fn summary(result: &VerificationResult) -> String {
    let mut out = format!(
        "Table {}: {} / {} rows, {} of {} sampled ids short (threshold {})",
        result.table,
        result.observed_rows,
        result.expected_rows,
        result.failures(),
        result.sampled,
        result.failure_threshold,
    );
    for shortfall in &result.shortfalls {
        out.push_str(&format!("\n  id {}: {} results", shortfall.id, shortfall.returned));
    }
    out
}
