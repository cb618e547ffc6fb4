//! Core of clipbuddy: the snippet store, its JSON/CSV codecs and the
//! protocol that keeps open views in sync with it.

pub mod codec;
pub mod config;
pub mod csv_codec;
pub mod error;
pub mod keyboard;
pub mod models;
pub mod paste;
pub mod store;
pub mod sync;

// Re-export common items for convenience
pub use config::{get_config_dir, Config, ALL_MESSAGES};
pub use csv_codec::{CsvImport, ImportMode};
pub use error::{BuddyError, ErrorKind, Result};
pub use models::{single_line, GroupRef, Groups, MessageEntry, Mutation};
pub use paste::{paste_text, PasteOutcome};
pub use store::{Applied, Store};
pub use sync::{
    NotifyReport, Registration, RefreshView, SnippetHub, ViewHandle, ViewKind, ViewRegistry,
};
