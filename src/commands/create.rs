//! `tablegate create` command.

use std::path::Path;

use super::{load_config, load_task};
use crate::context::ServiceContext;
use crate::task::{DbmsTask, TableCreator, TaskDefinition};

/// Execute the `create` command against `ctx`.
///
/// Skips the task when its completion token already exists.
///
/// # Errors
///
/// Returns an error string if the task file is not a `create_table` task,
/// the config cannot be loaded, or table creation fails.
pub fn run_with_context(
    ctx: &ServiceContext,
    config_path: Option<&Path>,
    task_path: &Path,
) -> Result<(), String> {
    let TaskDefinition::CreateTable(task) = load_task(task_path)? else {
        return Err(format!("{} is not a create_table task", task_path.display()));
    };

    if task.complete(ctx.tokens.as_ref()).map_err(|e| e.to_string())? {
        println!("Table {} already complete ({})", task.table_name(), task.output_token());
        return Ok(());
    }

    let config = load_config(config_path)?;
    TableCreator::new(&task).run(ctx, &config).map_err(|e| e.to_string())?;
    println!("Created table {} on {}", task.table_name(), task.backend());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, write, CONFIG};
    use crate::ports::fakes::FakeConnector;

    const TASK: &str = "\
kind: create_table
backend: postgres
output_token: /tokens/events.created
table:
  name: events
  fields:
    - {name: id, type: integer}
  primary_key: [id]
";

    #[test]
    fn creates_table_then_skips_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "db.yaml", CONFIG);
        let task = write(dir.path(), "task.yaml", TASK);
        let connector = FakeConnector::default();
        let ctx = context(&connector);

        run_with_context(&ctx, Some(config.as_path()), &task).unwrap();
        assert!(ctx.tokens.exists("/tokens/events.created").unwrap());
        let calls = connector.log().len();

        run_with_context(&ctx, Some(config.as_path()), &task).unwrap();
        assert_eq!(connector.log().len(), calls);
    }

    #[test]
    fn rejects_sanity_task_file() {
        let dir = tempfile::tempdir().unwrap();
        let task = write(
            dir.path(),
            "task.yaml",
            "kind: sanity_test\nbackend: postgres\ntable: t\noutput_token: /x\nid_field: id\n",
        );
        let ctx = context(&FakeConnector::default());

        let err = run_with_context(&ctx, None, &task).unwrap_err();
        assert!(err.contains("is not a create_table task"));
    }
}
