//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::Command;

fn run_tablegate(cwd: &Path, args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_tablegate");
    Command::new(bin)
        .current_dir(cwd)
        .args(args)
        .env("TABLEGATE_CONFIG", cwd.join("absent.yaml"))
        .env_remove("TABLEGATE_RECORD")
        .env_remove("TABLEGATE_POSTGRES_DBNAME")
        .env_remove("TABLEGATE_POSTGRES_USER")
        .env_remove("TABLEGATE_POSTGRES_HOST")
        .env_remove("TABLEGATE_POSTGRES_PASSWORD")
        .env_remove("TABLEGATE_POSTGRES_PORT")
        .output()
        .expect("failed to run tablegate binary")
}

const SANITY_TASK: &str = "\
kind: sanity_test
backend: postgres
table: events
output_token: tokens/events.verified
id_field: id
";

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tablegate(dir.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("create"));
    assert!(stdout.contains("verify"));
    assert!(stdout.contains("status"));
}

#[test]
fn unknown_subcommand_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tablegate(dir.path(), &["drop"]);
    assert!(!output.status.success());
}

#[test]
fn status_reports_pending_then_complete() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("task.yaml"), SANITY_TASK).unwrap();

    let output = run_tablegate(dir.path(), &["status", "task.yaml"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("pending"));

    std::fs::create_dir_all(dir.path().join("tokens")).unwrap();
    std::fs::write(dir.path().join("tokens/events.verified"), "").unwrap();

    let output = run_tablegate(dir.path(), &["status", "task.yaml"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("complete"));
}

#[test]
fn verify_without_config_names_missing_key() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("task.yaml"), SANITY_TASK).unwrap();

    let output = run_tablegate(dir.path(), &["verify", "task.yaml"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("postgres.dbname"), "stderr was: {stderr}");
    assert!(!dir.path().join("tokens/events.verified").exists());
}

#[test]
fn verify_skips_completed_task() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("task.yaml"), SANITY_TASK).unwrap();
    std::fs::create_dir_all(dir.path().join("tokens")).unwrap();
    std::fs::write(dir.path().join("tokens/events.verified"), "").unwrap();

    let output = run_tablegate(dir.path(), &["verify", "task.yaml"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("already complete"));
}
