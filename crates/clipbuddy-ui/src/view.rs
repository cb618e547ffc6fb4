use crate::common::Notice;
use clipbuddy_core::{Applied, ImportMode, Mutation, RefreshView, Result, Store};
use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};
use std::path::PathBuf;

/// What a view asks its owner to do after handling a key.
///
/// Views never write to the store themselves: every change goes back to the
/// owner as a [`Mutation`] so it can be committed and broadcast to all views.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    None,
    Close,
    OpenManager,
    Commit(Mutation),
    /// Close the quick-paste view, then paste this text.
    Paste(String),
    Export(PathBuf),
    Import { path: PathBuf, mode: ImportMode },
}

/// A view the terminal app can host.
pub trait TerminalView: RefreshView {
    fn handle_key(&mut self, key: &KeyEvent, store: &Store) -> ViewAction;

    /// Text pasted into the terminal while this view has focus.
    fn handle_paste(&mut self, text: &str, store: &Store);

    /// Told the outcome of a [`ViewAction::Commit`] after every view was refreshed.
    fn after_commit(&mut self, result: &Result<Applied>, store: &Store);

    /// Show the outcome of an export or import.
    fn report(&mut self, notice: Notice);

    /// Draw into `area`; dialogs may overlay the whole frame.
    fn render(&mut self, f: &mut Frame, area: Rect);
}
