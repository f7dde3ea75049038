//! `tablegate status` command.

use std::path::Path;

use super::load_task;
use crate::context::ServiceContext;

/// Execute the `status` command: prints `complete` or `pending`.
///
/// # Errors
///
/// Returns an error string if the task file is invalid or the token store
/// cannot be queried.
pub fn run_with_context(ctx: &ServiceContext, task_path: &Path) -> Result<(), String> {
    let definition = load_task(task_path)?;
    let task = definition.task();
    let complete = task.complete(ctx.tokens.as_ref()).map_err(|e| e.to_string())?;
    let state = if complete { "complete" } else { "pending" };
    println!("{} {} {state} ({})", definition.kind(), task.table_name(), task.output_token());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, write};
    use crate::ports::fakes::FakeConnector;

    #[test]
    fn reports_on_token_state() {
        let dir = tempfile::tempdir().unwrap();
        let task = write(
            dir.path(),
            "task.yaml",
            "kind: sanity_test\nbackend: mysql\ntable: t\noutput_token: /x\nid_field: id\n",
        );
        let ctx = context(&FakeConnector::default());

        run_with_context(&ctx, &task).unwrap();
        ctx.tokens.write("/x").unwrap();
        run_with_context(&ctx, &task).unwrap();
    }

    #[test]
    fn missing_task_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&FakeConnector::default());
        let err = run_with_context(&ctx, &dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.contains("nope.yaml"));
    }
}
