use crate::common::{error_color, highlight_style, title_style, Notice, TextInput, HELP_STYLE};
use crate::dialog::{render_notice, Choice, Confirm, DialogOutcome, Prompt};
use crate::editor::{EditorOutcome, MessageEditor};
use crate::view::{TerminalView, ViewAction};
use clipbuddy_core::config::EXPORT_FILENAME;
use clipbuddy_core::{
    Applied, GroupRef, ImportMode, MessageEntry, Mutation, RefreshView, Result, Store, ViewKind,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Groups,
    Search,
    Messages,
}

#[derive(Debug)]
enum Modal {
    AddGroup(Prompt),
    RenameGroup { from: String, prompt: Prompt },
    DeleteGroup { name: String, confirm: Confirm },
    AddMessage { group: String, editor: MessageEditor },
    ConfirmDuplicate { group: String, text: String, confirm: Confirm },
    EditMessage { entry: MessageEntry, editor: MessageEditor },
    DeleteMessage { entry: MessageEntry, confirm: Confirm },
    ExportPath(Prompt),
    ImportPath(Prompt),
    ImportMode { path: PathBuf, choice: Choice<ImportMode> },
    Notice(Notice),
}

/// Group and message management.
#[derive(Debug)]
pub struct Manager {
    groups: Vec<String>,
    group_state: ListState,
    messages: Vec<MessageEntry>,
    message_state: ListState,
    search: TextInput,
    pane: Pane,
    modal: Option<Modal>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            group_state: ListState::default(),
            messages: Vec::new(),
            message_state: ListState::default(),
            search: TextInput::default(),
            pane: Pane::Groups,
            modal: None,
        }
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn selected_group(&self) -> Option<&str> {
        self.group_state
            .selected()
            .and_then(|idx| self.groups.get(idx))
            .map(String::as_str)
    }

    pub fn messages(&self) -> &[MessageEntry] {
        &self.messages
    }

    pub fn selected_message(&self) -> Option<&MessageEntry> {
        self.message_state
            .selected()
            .and_then(|idx| self.messages.get(idx))
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    pub fn has_modal(&self) -> bool {
        self.modal.is_some()
    }

    pub fn notice(&self) -> Option<&Notice> {
        match &self.modal {
            Some(Modal::Notice(notice)) => Some(notice),
            _ => None,
        }
    }

    /// Select `name` in the group list and load its messages.
    pub fn select_group(&mut self, name: &str, store: &Store) {
        if let Some(idx) = self.groups.iter().position(|group| group == name) {
            self.group_state.select(Some(idx));
            self.message_state.select(Some(0));
            self.requery(store);
        }
    }

    fn requery(&mut self, store: &Store) {
        self.messages = match self.selected_group() {
            Some(name) => store.list_messages(&GroupRef::real(name), self.search.value()),
            None => Vec::new(),
        };
        let selected = match self.messages.len() {
            0 => None,
            len => Some(self.message_state.selected().unwrap_or(0).min(len - 1)),
        };
        self.message_state.select(selected);
    }

    fn move_group(&mut self, delta: isize, store: &Store) {
        if self.groups.is_empty() {
            return;
        }
        let last = self.groups.len() as isize - 1;
        let current = self.group_state.selected().unwrap_or(0) as isize;
        self.group_state
            .select(Some((current + delta).clamp(0, last) as usize));
        self.message_state.select(Some(0));
        self.requery(store);
    }

    fn move_message(&mut self, delta: isize) {
        if self.messages.is_empty() {
            return;
        }
        let last = self.messages.len() as isize - 1;
        let current = self.message_state.selected().unwrap_or(0) as isize;
        self.message_state
            .select(Some((current + delta).clamp(0, last) as usize));
    }

    fn show(&mut self, notice: Notice) {
        self.modal = Some(Modal::Notice(notice));
    }

    fn require_group(&mut self) -> Option<String> {
        let group = self.selected_group().map(str::to_string);
        if group.is_none() {
            self.show(Notice::warning("No group selected", "Select a group first."));
        }
        group
    }

    fn require_message(&mut self) -> Option<MessageEntry> {
        let entry = self.selected_message().cloned();
        if entry.is_none() {
            self.show(Notice::warning(
                "No message selected",
                "Select a message first.",
            ));
        }
        entry
    }

    fn handle_modal(&mut self, modal: Modal, key: &KeyEvent, store: &Store) -> ViewAction {
        match modal {
            Modal::AddGroup(mut prompt) => match prompt.handle_key(key) {
                DialogOutcome::Pending => self.modal = Some(Modal::AddGroup(prompt)),
                DialogOutcome::Done(name) => return ViewAction::Commit(Mutation::AddGroup(name)),
                DialogOutcome::Cancelled => {}
            },
            Modal::RenameGroup { from, mut prompt } => match prompt.handle_key(key) {
                DialogOutcome::Pending => self.modal = Some(Modal::RenameGroup { from, prompt }),
                DialogOutcome::Done(to) => {
                    return ViewAction::Commit(Mutation::RenameGroup { from, to })
                }
                DialogOutcome::Cancelled => {}
            },
            Modal::DeleteGroup { name, confirm } => match confirm.handle_key(key) {
                DialogOutcome::Pending => self.modal = Some(Modal::DeleteGroup { name, confirm }),
                DialogOutcome::Done(()) => return ViewAction::Commit(Mutation::DeleteGroup(name)),
                DialogOutcome::Cancelled => {}
            },
            Modal::AddMessage { group, mut editor } => match editor.handle_key(key) {
                EditorOutcome::Continue => self.modal = Some(Modal::AddMessage { group, editor }),
                EditorOutcome::Save(text) => {
                    if store.contains_message(&group, &text) {
                        self.modal = Some(Modal::ConfirmDuplicate {
                            group,
                            text,
                            confirm: Confirm::new(
                                "Duplicate message",
                                "This message already exists in the group. Add it anyway?",
                            ),
                        });
                    } else {
                        return ViewAction::Commit(Mutation::AddMessage { group, text });
                    }
                }
                EditorOutcome::Cancel => {}
            },
            Modal::ConfirmDuplicate {
                group,
                text,
                confirm,
            } => match confirm.handle_key(key) {
                DialogOutcome::Pending => {
                    self.modal = Some(Modal::ConfirmDuplicate {
                        group,
                        text,
                        confirm,
                    })
                }
                DialogOutcome::Done(()) => {
                    return ViewAction::Commit(Mutation::AddMessage { group, text })
                }
                DialogOutcome::Cancelled => {}
            },
            Modal::EditMessage { entry, mut editor } => match editor.handle_key(key) {
                EditorOutcome::Continue => self.modal = Some(Modal::EditMessage { entry, editor }),
                EditorOutcome::Save(text) => {
                    return ViewAction::Commit(Mutation::EditMessage { entry, text })
                }
                EditorOutcome::Cancel => {}
            },
            Modal::DeleteMessage { entry, confirm } => match confirm.handle_key(key) {
                DialogOutcome::Pending => self.modal = Some(Modal::DeleteMessage { entry, confirm }),
                DialogOutcome::Done(()) => return ViewAction::Commit(Mutation::DeleteMessage(entry)),
                DialogOutcome::Cancelled => {}
            },
            Modal::ExportPath(mut prompt) => match prompt.handle_key(key) {
                DialogOutcome::Pending => self.modal = Some(Modal::ExportPath(prompt)),
                DialogOutcome::Done(path) if path.is_empty() => {}
                DialogOutcome::Done(path) => return ViewAction::Export(PathBuf::from(path)),
                DialogOutcome::Cancelled => {}
            },
            Modal::ImportPath(mut prompt) => match prompt.handle_key(key) {
                DialogOutcome::Pending => self.modal = Some(Modal::ImportPath(prompt)),
                DialogOutcome::Done(path) if path.is_empty() => {}
                DialogOutcome::Done(path) => {
                    self.modal = Some(Modal::ImportMode {
                        path: PathBuf::from(path),
                        choice: Choice::new(
                            "Import CSV",
                            "Merge the rows into the current data, or replace everything?",
                            [
                                ('m', "merge", ImportMode::Merge),
                                ('r', "replace", ImportMode::Replace),
                            ],
                        ),
                    })
                }
                DialogOutcome::Cancelled => {}
            },
            Modal::ImportMode { path, choice } => match choice.handle_key(key) {
                DialogOutcome::Pending => self.modal = Some(Modal::ImportMode { path, choice }),
                DialogOutcome::Done(mode) => return ViewAction::Import { path, mode },
                DialogOutcome::Cancelled => {}
            },
            // Any key dismisses a notice
            Modal::Notice(_) => {}
        }
        ViewAction::None
    }

    fn handle_search_key(&mut self, key: &KeyEvent, store: &Store) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Down | KeyCode::Tab => {
                self.pane = Pane::Messages;
            }
            _ => {
                if self.search.handle_key(key) {
                    self.message_state.select(Some(0));
                    self.requery(store);
                }
            }
        }
    }

    fn delete_group_dialog(&mut self, store: &Store) {
        if let Some(name) = self.require_group() {
            let count = store.group(&name).map(|messages| messages.len()).unwrap_or(0);
            let question = format!(
                "Delete the group '{}' and its {} messages?",
                name, count
            );
            self.modal = Some(Modal::DeleteGroup {
                name,
                confirm: Confirm::new("Delete group", question),
            });
        }
    }

    fn delete_message_dialog(&mut self) {
        if let Some(entry) = self.require_message() {
            let question = format!("Delete this message?\n\n{}", entry.display());
            self.modal = Some(Modal::DeleteMessage {
                entry,
                confirm: Confirm::new("Delete message", question),
            });
        }
    }

    fn edit_message_dialog(&mut self) {
        if let Some(entry) = self.require_message() {
            let editor = MessageEditor::new(format!("Edit message in {}", entry.group), &entry.text);
            self.modal = Some(Modal::EditMessage { entry, editor });
        }
    }
}

impl RefreshView for Manager {
    fn kind(&self) -> ViewKind {
        ViewKind::Manager
    }

    fn refresh(&mut self, store: &Store) -> Result<()> {
        let previous = self.selected_group().map(str::to_string);
        self.groups = store
            .sorted_group_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let selected = previous
            .and_then(|name| self.groups.iter().position(|group| *group == name))
            .or_else(|| match self.groups.len() {
                0 => None,
                len => Some(self.group_state.selected().unwrap_or(0).min(len - 1)),
            });
        self.group_state.select(selected);
        self.requery(store);
        Ok(())
    }
}

impl TerminalView for Manager {
    fn handle_key(&mut self, key: &KeyEvent, store: &Store) -> ViewAction {
        if let Some(modal) = self.modal.take() {
            return self.handle_modal(modal, key, store);
        }
        if self.pane == Pane::Search {
            self.handle_search_key(key, store);
            return ViewAction::None;
        }
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return ViewAction::None;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return ViewAction::Close,
            KeyCode::Tab | KeyCode::BackTab => {
                self.pane = match self.pane {
                    Pane::Groups => Pane::Messages,
                    _ => Pane::Groups,
                };
            }
            KeyCode::Char('/') => self.pane = Pane::Search,
            KeyCode::Up => match self.pane {
                Pane::Groups => self.move_group(-1, store),
                _ => self.move_message(-1),
            },
            KeyCode::Down => match self.pane {
                Pane::Groups => self.move_group(1, store),
                _ => self.move_message(1),
            },
            KeyCode::Char('a') => {
                self.modal = Some(Modal::AddGroup(Prompt::new(
                    "Add group",
                    "Group name:",
                    "",
                )));
            }
            KeyCode::Char('r') => {
                if let Some(from) = self.require_group() {
                    let prompt = Prompt::new("Rename group", "New name:", &from);
                    self.modal = Some(Modal::RenameGroup { from, prompt });
                }
            }
            KeyCode::Char('d') => self.delete_group_dialog(store),
            KeyCode::Char('n') => {
                if let Some(group) = self.require_group() {
                    let editor = MessageEditor::new(format!("New message in {}", group), "");
                    self.modal = Some(Modal::AddMessage { group, editor });
                }
            }
            KeyCode::Char('e') => self.edit_message_dialog(),
            KeyCode::Enter if self.pane == Pane::Messages => self.edit_message_dialog(),
            KeyCode::Enter => self.pane = Pane::Messages,
            KeyCode::Char('x') => self.delete_message_dialog(),
            KeyCode::Delete => match self.pane {
                Pane::Groups => self.delete_group_dialog(store),
                _ => self.delete_message_dialog(),
            },
            KeyCode::Char('E') => {
                self.modal = Some(Modal::ExportPath(Prompt::new(
                    "Export CSV",
                    "Write all messages to:",
                    EXPORT_FILENAME,
                )));
            }
            KeyCode::Char('I') => {
                self.modal = Some(Modal::ImportPath(Prompt::new(
                    "Import CSV",
                    "Read messages from:",
                    "",
                )));
            }
            _ => {}
        }
        ViewAction::None
    }

    fn handle_paste(&mut self, text: &str, store: &Store) {
        if self.modal.is_none() {
            if self.pane == Pane::Search {
                self.search.insert_str(text);
                self.message_state.select(Some(0));
                self.requery(store);
            }
            return;
        }
        match &mut self.modal {
            Some(Modal::AddGroup(prompt))
            | Some(Modal::RenameGroup { prompt, .. })
            | Some(Modal::ExportPath(prompt))
            | Some(Modal::ImportPath(prompt)) => prompt.insert_str(text),
            Some(Modal::AddMessage { editor, .. }) | Some(Modal::EditMessage { editor, .. }) => {
                editor.insert_str(text)
            }
            _ => {}
        }
    }

    fn after_commit(&mut self, result: &Result<Applied>, store: &Store) {
        match result {
            Ok(Applied::GroupAdded(name)) | Ok(Applied::GroupRenamed { to: name, .. }) => {
                self.select_group(name, store);
                self.pane = Pane::Groups;
            }
            Ok(Applied::MessageAdded { group, position })
            | Ok(Applied::MessageEdited { group, position }) => {
                let found = self
                    .messages
                    .iter()
                    .position(|entry| entry.group == *group && entry.position == *position);
                if found.is_some() {
                    self.message_state.select(found);
                }
                self.pane = Pane::Messages;
            }
            Ok(_) => {}
            Err(err) if err.is_user_error() => self.show(Notice::error("Not changed", err)),
            Err(err) => self.show(Notice {
                title: "Not saved".to_string(),
                message: format!("{}\nThe change is kept until clipbuddy exits.", err),
                color: error_color(err.kind()),
            }),
        }
    }

    fn report(&mut self, notice: Notice) {
        self.show(notice);
    }

    fn render(&mut self, f: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(5),    // Panes
                Constraint::Length(1), // Help text
            ])
            .split(area);

        f.render_widget(
            Paragraph::new(format!(
                "Manage groups ({} groups)",
                self.groups.len()
            ))
            .style(title_style()),
            rows[0],
        );

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(rows[1]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(panes[1]);

        let border = |pane: Pane| {
            if self.pane == pane {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            }
        };

        let group_items: Vec<ListItem> = self
            .groups
            .iter()
            .map(|name| ListItem::new(name.as_str()))
            .collect();
        let group_list = List::new(group_items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Groups ")
                    .border_style(border(Pane::Groups)),
            )
            .highlight_style(highlight_style())
            .highlight_symbol("> ");
        f.render_stateful_widget(group_list, panes[0], &mut self.group_state);

        let search = Paragraph::new(self.search.line(self.pane == Pane::Search)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search ")
                .border_style(border(Pane::Search)),
        );
        f.render_widget(search, right[0]);

        let title = match self
            .group_state
            .selected()
            .and_then(|idx| self.groups.get(idx))
        {
            Some(name) => format!(" {} ({}) ", name, self.messages.len()),
            None => " Messages ".to_string(),
        };
        let message_items: Vec<ListItem> = self
            .messages
            .iter()
            .map(|entry| ListItem::new(entry.display()))
            .collect();
        let message_list = List::new(message_items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(border(Pane::Messages)),
            )
            .highlight_style(highlight_style())
            .highlight_symbol("> ");
        f.render_stateful_widget(message_list, right[1], &mut self.message_state);

        let help = Paragraph::new(
            "a/r/d: add/rename/delete group | n/e/x: add/edit/delete message | /: search | Tab: pane | E/I: export/import | Esc: close",
        )
        .style(HELP_STYLE);
        f.render_widget(help, rows[2]);

        match &self.modal {
            None => {}
            Some(Modal::AddGroup(prompt))
            | Some(Modal::RenameGroup { prompt, .. })
            | Some(Modal::ExportPath(prompt))
            | Some(Modal::ImportPath(prompt)) => prompt.render(f),
            Some(Modal::DeleteGroup { confirm, .. })
            | Some(Modal::ConfirmDuplicate { confirm, .. })
            | Some(Modal::DeleteMessage { confirm, .. }) => confirm.render(f),
            Some(Modal::AddMessage { editor, .. }) | Some(Modal::EditMessage { editor, .. }) => {
                editor.render(f)
            }
            Some(Modal::ImportMode { choice, .. }) => choice.render(f),
            Some(Modal::Notice(notice)) => render_notice(f, notice),
        }
    }
}
