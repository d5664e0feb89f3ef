//! FILENAME: app/server/src/logging.rs
// PURPOSE: Unified logging for the tool server.
// FORMAT: seq|level|category|message
// CONTEXT: stdout carries the protocol, so log lines go to the optional log
//          file and to the `log` facade, never to stdout.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;

// ============================================================================
// LEVELS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    /// One-letter tag written in the level column.
    pub fn tag(self) -> &'static str {
        match self {
            LogLevel::Debug => "D",
            LogLevel::Info => "I",
            LogLevel::Warn => "W",
            LogLevel::Error => "E",
        }
    }

    fn from_tag(tag: &str) -> LogLevel {
        match tag {
            "D" => LogLevel::Debug,
            "W" => LogLevel::Warn,
            "E" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    fn facade_level(self) -> log::Level {
        match self {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }

    fn from_u8(value: u8) -> LogLevel {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

// ============================================================================
// UNIFIED LOGGING SYSTEM
// ============================================================================

/// Global sequence counter
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

static MIN_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Global log file handle
pub static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

/// Get next sequence number
pub fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst) + 1
}

pub fn set_min_level(level: LogLevel) {
    MIN_LEVEL.store(level as u8, Ordering::SeqCst);
}

pub fn min_level() -> LogLevel {
    LogLevel::from_u8(MIN_LEVEL.load(Ordering::SeqCst))
}

/// Opens (truncating) the log file. Parent directories are created.
pub fn init_log_file(path: &Path) -> Result<PathBuf, String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create log dir at {:?}: {}", parent, e))?;
        }
    }

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| format!("Failed to create log file {:?}: {}", path, e))?;

    let mut log_file = LOG_FILE.lock().map_err(|e| format!("Lock error: {}", e))?;
    *log_file = Some(file);

    Ok(path.to_path_buf())
}

/// Write a log line in unified format
pub fn write_log(level: &str, category: &str, message: &str) {
    let parsed = LogLevel::from_tag(level);
    if parsed < min_level() {
        return;
    }

    let seq = next_seq();
    let line = format!("{}|{}|{}|{}", seq, level, category, message);

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            if let Err(e) = writeln!(file, "{}", line) {
                eprintln!("[LOG_ERROR] Failed to write: {}", e);
            }
            let _ = file.flush();
        }
    }

    log::log!(target: "sheet_server", parsed.facade_level(), "{}|{}", category, message);
}

/// Write an ENTER log line for function entry
pub fn write_log_enter(level: &str, category: &str, func_name: &str, params: &str) {
    let message = if params.is_empty() {
        format!("ENTER {}", func_name)
    } else {
        format!("ENTER {} {}", func_name, params)
    };
    write_log(level, category, &message);
}

/// Write an EXIT log line for function exit
pub fn write_log_exit(level: &str, category: &str, func_name: &str, result: &str) {
    let message = if result.is_empty() {
        format!("EXIT {}", func_name)
    } else {
        format!("EXIT {} {}", func_name, result)
    };
    write_log(level, category, &message);
}

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log("D", $cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log("I", $cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log("W", $cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log("E", $cat, &format!($($arg)*))
    };
}

// ENTER/EXIT macros for function tracing

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_enter("D", $cat, $func, "")
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_enter("D", $cat, $func, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_exit("D", $cat, $func, "")
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_exit("D", $cat, $func, &format!($($arg)*))
    };
}

pub use log_debug;
pub use log_enter;
pub use log_error;
pub use log_exit;
pub use log_info;
pub use log_warn;
