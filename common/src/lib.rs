pub mod error;
pub mod event_log;

pub use error::{CommonError, Result};
pub use event_log::EventLog;

use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Format used for every timestamp carried by a history entry.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local wall-clock time, second resolution.
pub fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `log_level` when set. With a `log_dir` the output goes
/// to a daily rolling file through a non-blocking writer; the returned guard
/// must be held until shutdown or buffered lines are lost.
pub fn init_tracing(
    log_dir: Option<&str>,
    log_file: &str,
    log_level: &str,
) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .map_err(|e| CommonError::InvalidLogFilter(format!("{log_level}: {e}")))?,
    };

    if let Some(log_dir) = log_dir {
        fs::create_dir_all(log_dir)?;
        let file_appender = tracing_appender::rolling::daily(log_dir, log_file);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_ansi(false),
            )
            .try_init()
            .map_err(|e| CommonError::SubscriberInit(e.to_string()))?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_ansi(true),
            )
            .try_init()
            .map_err(|e| CommonError::SubscriberInit(e.to_string()))?;
        Ok(None)
    }
}
