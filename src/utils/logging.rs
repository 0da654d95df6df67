use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};

use crate::config::AppConfig;

pub const LOG_FILE_PREFIX: &str = "wiki-roll.log";

/// Daily rolling appender inside `dir`, creating the directory if needed.
pub fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
}

/// Install the global subscriber. Diagnostics never go to the terminal: the
/// dashboard owns it and the launcher usually runs without one. When the log
/// directory cannot be created the events are discarded.
///
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(config: &AppConfig) -> WorkerGuard {
    let log_dir = config.log_dir();
    let (appender, init_error) = match file_appender(&log_dir) {
        Ok(appender) => (tracing_appender::non_blocking(appender), None),
        Err(e) => (tracing_appender::non_blocking(std::io::sink()), Some(e)),
    };
    let (non_blocking, guard) = appender;

    // RUST_LOG takes precedence over the configured levels.
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::EnvFilter::from_default_env(),
        Err(_) => tracing_subscriber::EnvFilter::new(config.logging.filter_directives()),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .compact()
        .try_init();

    if let Err(e) = installed {
        eprintln!("Could not install log subscriber: {e}");
    }
    if let Some(e) = init_error {
        eprintln!(
            "Diagnostic logging disabled, cannot use {}: {e}",
            log_dir.display()
        );
    }

    guard
}
