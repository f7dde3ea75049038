//! Command dispatch and handlers.

pub mod create;
pub mod status;
pub mod verify;

use std::env;
use std::path::{Path, PathBuf};

use crate::cassette::session::{RecordingSession, RECORD_ENV};
use crate::cli::{Cli, Command};
use crate::config::DbmsConfig;
use crate::context::ServiceContext;
use crate::task::TaskDefinition;

/// Dispatch a parsed command to its handler.
///
/// When `TABLEGATE_RECORD` is set to a directory path, all port
/// interactions are recorded to per-port cassette files in that directory.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let (ctx, session) = if let Ok(path) = env::var(RECORD_ENV) {
        let (ctx, session) = ServiceContext::recording_at(PathBuf::from(path))?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(), None)
    };

    let result = dispatch_with_context(cli, &ctx);

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
fn dispatch_with_context(cli: &Cli, ctx: &ServiceContext) -> Result<(), String> {
    let config = cli.config.as_deref();
    match &cli.command {
        Command::Create { task } => create::run_with_context(ctx, config, task),
        Command::Verify { task } => verify::run_with_context(ctx, config, task),
        Command::Status { task } => status::run_with_context(ctx, task),
    }
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}

fn load_task(path: &Path) -> Result<TaskDefinition, String> {
    TaskDefinition::load(path).map_err(|e| e.to_string())
}

fn load_config(explicit: Option<&Path>) -> Result<DbmsConfig, String> {
    let path = DbmsConfig::resolve_path(explicit);
    tracing::debug!(path = %path.display(), "loading connection config");
    DbmsConfig::load(&path)
}
