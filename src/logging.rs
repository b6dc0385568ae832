//! File logging. The terminal belongs to the UI, so nothing goes to stdout.

use std::{fs, io, path::Path};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LOG_FILE;

pub const LOG_ENV: &str = "DAYTIMER_LOG";
const DEFAULT_FILTER: &str = "daytimer=info";

/// Installs the global subscriber writing to `dir/daytimer.log`.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init(dir: &Path) -> io::Result<WorkerGuard> {
    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(guard)
}
