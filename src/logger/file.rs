/// Plain-text file mirror of the console log
///
/// Writes to `logs/roomsync.log`. File logging is best-effort: if the file
/// can't be opened or written, console output continues unaffected.
use std::fs::{ File, OpenOptions };
use std::io::Write;
use std::sync::Mutex;

use once_cell::sync::OnceCell;

use crate::paths;

static LOG_FILE: OnceCell<Option<Mutex<File>>> = OnceCell::new();

/// Open the log file, creating the directory first if needed
pub fn init_file_logging() {
    let _ = LOG_FILE.get_or_init(open_log_file);
}

fn open_log_file() -> Option<Mutex<File>> {
    let path = paths::get_log_file_path();
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(Mutex::new(file)),
        Err(e) => {
            eprintln!("logger: could not open {}: {}", path.display(), e);
            None
        }
    }
}

/// Append one line to the log file
pub fn write_to_file(line: &str) {
    if let Some(Some(file)) = LOG_FILE.get().map(|f| f.as_ref()) {
        if let Ok(mut file) = file.lock() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

/// Flush pending writes
pub fn flush_file_logging() {
    if let Some(Some(file)) = LOG_FILE.get().map(|f| f.as_ref()) {
        if let Ok(mut file) = file.lock() {
            let _ = file.flush();
        }
    }
}
