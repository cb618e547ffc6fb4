//! `tracing` subscriber setup.
//!
//! While the views own the terminal, log lines go to a file in the data
//! directory; one-shot commands log to stderr.

use clipbuddy_core::config::LOG_ENV;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const FILE_DEFAULT: &str = "info";
const STDERR_DEFAULT: &str = "warn";

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Append log lines to `path`. Falls back to stderr if the file cannot be
/// opened.
pub fn init_file_logging(path: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", path.display(), e);
            init_stderr_logging();
            return;
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(FILE_DEFAULT))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init();
}

pub fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(STDERR_DEFAULT))
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logging_creates_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipbuddy.log");
        init_file_logging(&path);
        assert!(path.exists());
    }
}
