//! CLI command implementations

pub mod balance;
pub mod categories;
pub mod import;
pub mod list;
pub mod logs;
pub mod new;
pub mod remove;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tally_core::{EntryPoint, LogEvent, LoggingService, TallyContext};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let tally_dir = get_tally_dir().ok()?;
    std::fs::create_dir_all(&tally_dir).ok()?;
    LoggingService::new(&tally_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Record that `command` started
pub fn log_command(logger: &Option<LoggingService>, command: &str) {
    if let Some(l) = logger {
        let _ = l.log_command(command);
    }
}

/// Log the outcome of a command: `success_event` on Ok, `failure_event`
/// with the error message otherwise.
pub fn log_outcome<T>(
    logger: &Option<LoggingService>,
    command: &str,
    success_event: &str,
    failure_event: &str,
    result: &Result<T, tally_core::Error>,
) {
    let event = match result {
        Ok(_) => LogEvent::new(success_event),
        Err(e) => LogEvent::new(failure_event)
            .with_error(e.to_string())
            .with_error_details(format!("{:?}", e)),
    };
    log_event(logger, event.with_command(command));
}

/// Get the tally directory from environment or default
pub fn get_tally_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TALLY_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".tally"))
}

/// Get or create tally context
pub fn get_context() -> Result<TallyContext> {
    let tally_dir = get_tally_dir()?;
    TallyContext::new(&tally_dir).context("Failed to initialize tally context")
}
