//! File-backed diagnostics. The terminal belongs to the UI, so nothing is ever printed.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE_LOGGING: AtomicBool = AtomicBool::new(false);

static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

/// Opens (and truncates) the log file. Until this is called every log call is dropped.
pub fn init_log_file(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    if let Ok(mut log_file) = LOG_FILE.lock() {
        *log_file = Some(file);
    }
    Ok(())
}

pub fn enable_verbose_logging() {
    VERBOSE_LOGGING.store(true, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE_LOGGING.load(Ordering::Relaxed)
}

/// Writes one line tagged with `level`. Write errors are ignored.
pub fn write_log(level: &str, message: &str) {
    if let Ok(mut log_file) = LOG_FILE.lock() {
        if let Some(file) = log_file.as_mut() {
            let _ = writeln!(file, "[{level}] {message}");
            let _ = file.flush();
        }
    }
}

/// Always-on log line (still needs a log file).
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::write_log("info", &format!($($arg)*))
    };
}

/// Verbose log line, only written with `--verbose`.
#[macro_export]
macro_rules! vlog {
    ($($arg:tt)*) => {
        if $crate::logging::is_verbose() {
            $crate::logging::write_log("debug", &format!($($arg)*));
        }
    };
}
