use crate::{config::AppConfig, lock_or_recover, telemetry};
use std::{
    env,
    fs::{self, File, OpenOptions},
    io::Write,
    panic,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    time::{SystemTime, UNIX_EPOCH},
};

const LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
const CRASH_LOG_MAX_BYTES: u64 = 256 * 1024;
static LOG_ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG: Mutex<Option<CappedLog>> = Mutex::new(None);

/// Debug log in the temp dir; truncated once it passes 5 MiB.
pub fn log_file_path() -> PathBuf {
    env::temp_dir().join("localizer.log")
}

/// Crash log in the temp dir; one line per panic.
pub fn crash_log_path() -> PathBuf {
    env::temp_dir().join("localizer_crash.log")
}

/// Append-only file that starts over instead of growing past `cap` bytes.
pub(super) struct CappedLog {
    path: PathBuf,
    file: File,
    cap: u64,
    len: u64,
}

impl CappedLog {
    pub(super) fn open(path: &Path, cap: u64) -> Option<Self> {
        let len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let (file, len) = if len > cap {
            (open_truncated(path)?, 0)
        } else {
            (OpenOptions::new().create(true).append(true).open(path).ok()?, len)
        };
        Some(Self {
            path: path.to_path_buf(),
            file,
            cap,
            len,
        })
    }

    pub(super) fn append(&mut self, line: &str) {
        let incoming = line.len() as u64;
        if self.len.saturating_add(incoming) > self.cap {
            match open_truncated(&self.path) {
                Some(file) => {
                    self.file = file;
                    self.len = 0;
                }
                None => return,
            }
        }
        if self.file.write_all(line.as_bytes()).is_ok() {
            self.len = self.len.saturating_add(incoming);
        }
    }
}

fn open_truncated(path: &Path) -> Option<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .ok()
}

fn stamped(msg: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("[{secs}] {msg}\n")
}

fn set_enabled(enabled: bool) {
    LOG_ENABLED.store(enabled, Ordering::Relaxed);
    *lock_or_recover(&DEBUG_LOG, "debug log") = enabled
        .then(|| CappedLog::open(&log_file_path(), LOG_MAX_BYTES))
        .flatten();
}

/// Configure logging based on CLI flags or environment.
pub fn init_logging(config: &AppConfig) {
    let enabled = config.logging_enabled();
    set_enabled(enabled);
    if enabled {
        telemetry::init_tracing();
    }
}

/// Append a timestamped line to the debug log when logging is enabled.
pub fn log_debug(msg: &str) {
    if !LOG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    if let Some(log) = lock_or_recover(&DEBUG_LOG, "debug log").as_mut() {
        log.append(&stamped(msg));
    }
}

/// Route panics through the crash log before the default hook prints them.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        previous(info);
    }));
}

/// Record where a panic happened; only active while file logging is on.
pub fn log_panic(info: &panic::PanicHookInfo<'_>) {
    if !LOG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let location = info
        .location()
        .map(|loc| format!("{}:{}", loc.file(), loc.line()))
        .unwrap_or_else(|| "unknown".to_string());
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|text| (*text).to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    if let Some(mut log) = CappedLog::open(&crash_log_path(), CRASH_LOG_MAX_BYTES) {
        log.append(&stamped(&format!(
            "panic at {location}: {payload} (v{})",
            env!("CARGO_PKG_VERSION")
        )));
    }
}

#[cfg(test)]
pub(crate) fn set_logging_for_tests(enabled: bool) {
    set_enabled(enabled);
}
