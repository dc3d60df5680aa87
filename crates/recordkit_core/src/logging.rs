//! Process-wide file logging.
//!
//! # Responsibility
//! - Start the rolling file logger once, from explicit values or `AppConfig`.
//! - Record panics as sanitized log events.
//!
//! # Invariants
//! - Starting again with the same settings is a no-op; other settings are
//!   rejected.
//! - Starting the logger never panics.
//! - Events carry ids, counts and durations, never record contents.

use crate::config::AppConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "recordkit";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

/// Configuration key holding the log level (`trace|debug|info|warn|error`).
pub const LOG_LEVEL_KEY: &str = "log_level";
/// Configuration key holding the absolute log directory.
pub const LOG_DIR_KEY: &str = "log_dir";

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Validated logger target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: &'static str,
    pub log_dir: PathBuf,
}

impl LogSettings {
    /// Validates a level name and an absolute log directory.
    pub fn new(level: &str, log_dir: &str) -> Result<Self, String> {
        Ok(Self {
            level: parse_level(level)?,
            log_dir: parse_log_dir(log_dir)?,
        })
    }

    /// Reads `log_level` and `log_dir` from `config`.
    ///
    /// A missing level falls back to [`default_log_level`]; a missing
    /// directory is an error, core never picks one on its own.
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        let level = config
            .property(LOG_LEVEL_KEY)
            .unwrap_or(default_log_level());
        let log_dir = config
            .property(LOG_DIR_KEY)
            .ok_or_else(|| format!("configuration key `{LOG_DIR_KEY}` is not set"))?;
        Self::new(level, log_dir)
    }
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Starts file logging at `level` under `log_dir`.
///
/// # Errors
/// - Unsupported level, or an empty or relative directory.
/// - The directory cannot be created or the backend fails to start.
/// - Logging is already active with other settings.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    start(LogSettings::new(level, log_dir)?)
}

/// [`init_logging`] with settings taken from `config`.
pub fn init_logging_from_config(config: &AppConfig) -> Result<(), String> {
    start(LogSettings::from_config(config)?)
}

/// Settings of the active logger, `None` before the first successful start.
pub fn logging_status() -> Option<LogSettings> {
    ACTIVE_LOGGER.get().map(|active| active.settings.clone())
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start(settings: LogSettings) -> Result<(), String> {
    let active = ACTIVE_LOGGER.get_or_try_init(|| open_logger(settings.clone()))?;
    if active.settings == settings {
        return Ok(());
    }
    Err(format!(
        "logging already active (level `{}`, dir `{}`); refusing to switch to level `{}`, dir `{}`",
        active.settings.level,
        active.settings.log_dir.display(),
        settings.level,
        settings.log_dir.display()
    ))
}

fn open_logger(settings: LogSettings) -> Result<ActiveLogger, String> {
    std::fs::create_dir_all(&settings.log_dir).map_err(|err| {
        format!(
            "failed to create log directory `{}`: {err}",
            settings.log_dir.display()
        )
    })?;

    let handle = Logger::try_with_str(settings.level)
        .map_err(|err| format!("invalid log level `{}`: {err}", settings.level))?
        .log_to_file(
            FileSpec::default()
                .directory(settings.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    PANIC_HOOK.get_or_init(install_panic_hook);
    info!(
        "event=logging_init module=logging status=ok level={} log_dir={} os={} version={}",
        settings.level,
        settings.log_dir.display(),
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        settings,
        _handle: handle,
    })
}

fn parse_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn parse_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook() {
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic module=core status=error location={} payload={}",
            location,
            panic_payload(panic_info)
        );
        previous_hook(panic_info);
    }));
}

fn panic_payload(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    single_line(message, MAX_PANIC_PAYLOAD_CHARS)
}

// Payloads may quote record values.
fn single_line(value: &str, max_chars: usize) -> String {
    let mut line = value
        .chars()
        .map(|ch| if matches!(ch, '\n' | '\r') { ' ' } else { ch })
        .take(max_chars)
        .collect::<String>();
    if value.chars().count() > max_chars {
        line.push_str("...");
    }
    line
}
