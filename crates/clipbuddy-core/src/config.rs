use crate::error::Result;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "ClipboardBuddyPro";
pub const DB_FILENAME: &str = "snippets.json";
pub const LOG_FILENAME: &str = "clipbuddy.log";
pub const PID_FILENAME: &str = "clipbuddy.pid";
pub const EXPORT_FILENAME: &str = "snippets.csv";

/// Name of the virtual group that lists every message.
pub const ALL_MESSAGES: &str = "Todos Los mensajes";

pub const DEFAULT_HOTKEY_POPUP: &str = "ctrl+shift+space";
pub const DEFAULT_HOTKEY_MANAGER: &str = "ctrl+shift+e";

/// Overrides the base data directory.
pub const HOME_ENV: &str = "CLIPBUDDY_HOME";
/// Log filter directives for `tracing-subscriber`.
pub const LOG_ENV: &str = "CLIPBUDDY_LOG";

/// Get the clipbuddy data directory
pub fn get_config_dir() -> PathBuf {
    base_dir().join(APP_NAME)
}

fn base_dir() -> PathBuf {
    if let Ok(home) = env::var(HOME_ENV) {
        if !home.trim().is_empty() {
            return PathBuf::from(home);
        }
    }
    dirs::data_dir()
        .or_else(|| env::var("HOME").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Static settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub popup_hotkey: String,
    pub manager_hotkey: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::with_data_dir(get_config_dir())
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            popup_hotkey: DEFAULT_HOTKEY_POPUP.to_string(),
            manager_hotkey: DEFAULT_HOTKEY_MANAGER.to_string(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILENAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILENAME)
    }

    pub fn pid_path(&self) -> PathBuf {
        self.data_dir.join(PID_FILENAME)
    }

    pub fn ensure_data_dir(&self) -> Result<&Path> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)?;
        }
        Ok(&self.data_dir)
    }
}
