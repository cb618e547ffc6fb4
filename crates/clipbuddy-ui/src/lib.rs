mod app;
mod common;
mod dialog;
mod editor;
mod manager;
mod quick_paste;
mod view;

// Public API
pub use app::{run_app, spawn_input_reader, App, AppEvent, AppOptions};
pub use common::{Notice, TextInput};
pub use editor::{EditorOutcome, MessageEditor};
pub use manager::{Manager, Pane};
pub use quick_paste::QuickPaste;
pub use view::{TerminalView, ViewAction};
