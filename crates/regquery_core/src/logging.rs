//! Process-wide rolling file logs.
//!
//! # Responsibility
//! - Start the `flexi_logger` file backend at most once per process.
//! - Capture panics as single-line log records.
//!
//! # Invariants
//! - Every record is one line of `event=... module=... status=...` pairs.
//! - Starting again with the same configuration is a no-op; a different
//!   level or directory is rejected.
//! - Starting logging never panics.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, Level};
use once_cell::sync::OnceCell;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_FILE_BASENAME: &str = "regquery";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

/// Level and directory a logger runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub log_dir: PathBuf,
}

struct ActiveLogger {
    config: LogConfig,
    handle: LoggerHandle,
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log directory must be an absolute, non-empty path, got `{}`", .0.display())]
    InvalidLogDir(PathBuf),
    #[error("logging already runs at {} in `{}`", active.level, active.log_dir.display())]
    Reconfigured { active: LogConfig },
    #[error("cannot create log directory `{}`: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("log backend failed to start: {0}")]
    Backend(#[from] flexi_logger::FlexiLoggerError),
}

/// Starts file logging at `level` under `log_dir`.
///
/// # Errors
/// - `InvalidLogDir` when `log_dir` is empty or relative.
/// - `Reconfigured` when logging already runs with another configuration.
/// - `CreateDir` or `Backend` when the backend cannot start.
pub fn init_logging(level: Level, log_dir: &Path) -> Result<(), LoggingError> {
    if log_dir.as_os_str().is_empty() || !log_dir.is_absolute() {
        return Err(LoggingError::InvalidLogDir(log_dir.to_path_buf()));
    }
    let requested = LogConfig {
        level,
        log_dir: log_dir.to_path_buf(),
    };

    let active = ACTIVE.get_or_try_init(|| start_backend(&requested))?;
    if active.config != requested {
        return Err(LoggingError::Reconfigured {
            active: active.config.clone(),
        });
    }
    Ok(())
}

/// Configuration of the running logger, if any.
pub fn logging_status() -> Option<LogConfig> {
    ACTIVE.get().map(|active| active.config.clone())
}

/// Writes buffered records to the log file.
///
/// Short-lived processes call this before exiting; the background flush
/// would otherwise never run.
pub fn flush_logging() {
    if let Some(active) = ACTIVE.get() {
        active.handle.flush();
    }
}

/// Level used when the operator does not choose one.
pub fn default_log_level() -> Level {
    if cfg!(debug_assertions) {
        Level::Debug
    } else {
        Level::Info
    }
}

fn start_backend(config: &LogConfig) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&config.log_dir).map_err(|source| LoggingError::CreateDir {
        path: config.log_dir.clone(),
        source,
    })?;

    let spec = LogSpecification::builder()
        .default(config.level.to_level_filter())
        .build();
    let handle = Logger::with(spec)
        .log_to_file(
            FileSpec::default()
                .directory(config.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!(
            "event=panic module=logging status=error location={} payload={}",
            panic_location(panic_info),
            one_line(&panic_payload(panic_info), PANIC_PAYLOAD_LIMIT)
        );
        previous_hook(panic_info);
    }));

    info!(
        "event=logging_init module=logging status=ok level={} log_dir={} version={}",
        config.level,
        config.log_dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        config: config.clone(),
        handle,
    })
}

fn panic_location(info: &PanicHookInfo<'_>) -> String {
    match info.location() {
        Some(location) => format!("{}:{}", location.file(), location.line()),
        None => "unknown".to_string(),
    }
}

fn panic_payload(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Collapses line breaks and caps `value` at `limit` characters.
fn one_line(value: &str, limit: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    if flattened.chars().count() <= limit {
        return flattened;
    }
    let mut capped: String = flattened.chars().take(limit).collect();
    capped.push_str("...");
    capped
}
