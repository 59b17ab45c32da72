//! File-based request trace log
//!
//! A process-global log appended to `localrelay-debug.log` in the temp
//! directory. Request bodies, headers and tool results are traced here.
//!
//! Disabled unless `LOCALRELAY_DEBUG` is `1` or `true`. The minimum level is
//! read from `LOCALRELAY_LOG_LEVEL` (default `debug`).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Parse a level name, case-insensitive
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO "),
            LogLevel::Warn => write!(f, "WARN "),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Env var switching the trace log on
pub const DEBUG_ENV: &str = "LOCALRELAY_DEBUG";

/// Env var holding the minimum trace level
pub const LEVEL_ENV: &str = "LOCALRELAY_LOG_LEVEL";

struct TraceLog {
    file: Option<File>,
    min_level: LogLevel,
}

impl TraceLog {
    fn from_env() -> Self {
        let enabled = std::env::var(DEBUG_ENV)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let min_level = std::env::var(LEVEL_ENV)
            .ok()
            .and_then(|v| LogLevel::parse(&v))
            .unwrap_or(LogLevel::Debug);

        let file = enabled
            .then(|| {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(log_file_path())
                    .ok()
            })
            .flatten();

        Self { file, min_level }
    }

    fn write(&mut self, level: LogLevel, module: &str, message: &str) {
        if level < self.min_level {
            return;
        }
        if let Some(file) = self.file.as_mut() {
            let module = module.strip_prefix("localrelay_core::").unwrap_or(module);
            let _ = writeln!(file, "[{}] [{}] [{}] {}", clock_time(), level, module, message);
            let _ = file.flush();
        }
    }
}

/// UTC wall-clock time as `HH:MM:SS.mmm`
fn clock_time() -> String {
    match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
        Ok(elapsed) => {
            let secs = elapsed.as_secs() % 86_400;
            format!(
                "{:02}:{:02}:{:02}.{:03}",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60,
                elapsed.subsec_millis()
            )
        }
        Err(_) => "??:??:??.???".to_string(),
    }
}

static TRACE_LOG: Lazy<Mutex<TraceLog>> = Lazy::new(|| Mutex::new(TraceLog::from_env()));

/// Append a line to the trace log if it is enabled and `level` passes
pub fn log(level: LogLevel, module: &str, message: &str) {
    TRACE_LOG.lock().write(level, module, message);
}

/// Log a debug message
pub fn debug(module: &str, message: &str) {
    log(LogLevel::Debug, module, message);
}

/// Log an info message
pub fn info(module: &str, message: &str) {
    log(LogLevel::Info, module, message);
}

/// Log a warning message
pub fn warn(module: &str, message: &str) {
    log(LogLevel::Warn, module, message);
}

/// Log an error message
pub fn error(module: &str, message: &str) {
    log(LogLevel::Error, module, message);
}

/// Whether the trace log is switched on
pub fn is_enabled() -> bool {
    TRACE_LOG.lock().file.is_some()
}

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::logging::file_logger::debug(module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        $crate::logging::file_logger::info(module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        $crate::logging::file_logger::warn(module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        $crate::logging::file_logger::error(module_path!(), &format!($($arg)*))
    };
}

/// Location of the trace log
pub fn log_file_path() -> PathBuf {
    std::env::temp_dir().join("localrelay-debug.log")
}
