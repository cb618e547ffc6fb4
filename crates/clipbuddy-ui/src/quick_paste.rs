use crate::common::{highlight_style, is_ctrl, title_style, Notice, TextInput, HELP_STYLE};
use crate::dialog::render_notice;
use crate::view::{TerminalView, ViewAction};
use clipbuddy_core::{
    Applied, GroupRef, MessageEntry, RefreshView, Result, Store, ViewKind,
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

const PAGE: usize = 10;

/// Pick a message by group and search text, then paste it.
#[derive(Debug, Default)]
pub struct QuickPaste {
    groups: Vec<GroupRef>,
    selected_group: GroupRef,
    search: TextInput,
    items: Vec<MessageEntry>,
    list_state: ListState,
    notice: Option<Notice>,
}

impl QuickPaste {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_group(&self) -> &GroupRef {
        &self.selected_group
    }

    pub fn items(&self) -> &[MessageEntry] {
        &self.items
    }

    pub fn selected(&self) -> Option<&MessageEntry> {
        self.list_state.selected().and_then(|idx| self.items.get(idx))
    }

    pub fn search(&self) -> &str {
        self.search.value()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn requery(&mut self, store: &Store) {
        self.items = store.list_messages(&self.selected_group, self.search.value());
        let selected = match self.items.len() {
            0 => None,
            len => Some(self.list_state.selected().unwrap_or(0).min(len - 1)),
        };
        self.list_state.select(selected);
    }

    fn cycle_group(&mut self, forward: bool, store: &Store) {
        if self.groups.is_empty() {
            return;
        }
        let len = self.groups.len();
        let current = self
            .groups
            .iter()
            .position(|group| *group == self.selected_group)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.selected_group = self.groups[next].clone();
        self.list_state.select(Some(0));
        self.requery(store);
    }

    fn move_selection(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() as isize - 1;
        let current = self.list_state.selected().unwrap_or(0) as isize;
        self.list_state
            .select(Some((current + delta).clamp(0, last) as usize));
    }
}

impl RefreshView for QuickPaste {
    fn kind(&self) -> ViewKind {
        ViewKind::QuickPaste
    }

    fn refresh(&mut self, store: &Store) -> Result<()> {
        self.groups = store.list_groups();
        if !self.groups.contains(&self.selected_group) {
            tracing::debug!(
                "group '{}' is gone, quick paste falls back to all messages",
                self.selected_group
            );
            self.selected_group = GroupRef::All;
        }
        self.requery(store);
        Ok(())
    }
}

impl TerminalView for QuickPaste {
    fn handle_key(&mut self, key: &KeyEvent, store: &Store) -> ViewAction {
        if self.notice.take().is_some() {
            return ViewAction::None;
        }
        if is_ctrl(key, 'e') {
            return ViewAction::OpenManager;
        }

        match key.code {
            KeyCode::Esc => ViewAction::Close,
            KeyCode::Enter => {
                let entry = self.selected().or_else(|| self.items.first());
                match entry {
                    Some(entry) => ViewAction::Paste(entry.text.clone()),
                    None => {
                        self.notice = Some(Notice::warning(
                            "Nothing to paste",
                            "There are no messages in this filter.",
                        ));
                        ViewAction::None
                    }
                }
            }
            KeyCode::Left | KeyCode::BackTab => {
                self.cycle_group(false, store);
                ViewAction::None
            }
            KeyCode::Right | KeyCode::Tab => {
                self.cycle_group(true, store);
                ViewAction::None
            }
            KeyCode::Up => {
                self.move_selection(-1);
                ViewAction::None
            }
            KeyCode::Down => {
                self.move_selection(1);
                ViewAction::None
            }
            KeyCode::PageUp => {
                self.move_selection(-(PAGE as isize));
                ViewAction::None
            }
            KeyCode::PageDown => {
                self.move_selection(PAGE as isize);
                ViewAction::None
            }
            _ => {
                if self.search.handle_key(key) {
                    self.list_state.select(Some(0));
                    self.requery(store);
                }
                ViewAction::None
            }
        }
    }

    fn handle_paste(&mut self, text: &str, store: &Store) {
        self.search.insert_str(text);
        self.list_state.select(Some(0));
        self.requery(store);
    }

    fn after_commit(&mut self, _result: &Result<Applied>, _store: &Store) {}

    fn report(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    fn render(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Group selector
                Constraint::Length(3), // Search
                Constraint::Min(3),    // Results
                Constraint::Length(1), // Help text
            ])
            .split(area);

        let position = self
            .groups
            .iter()
            .position(|group| *group == self.selected_group)
            .map(|idx| idx + 1)
            .unwrap_or(1);
        let selector = Paragraph::new(Line::from(vec![
            Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.selected_group.name().to_string(), title_style()),
            Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("   ({}/{})", position, self.groups.len().max(1)),
                HELP_STYLE,
            ),
        ]))
        .block(Block::default().borders(Borders::ALL).title(" Group "));
        f.render_widget(selector, chunks[0]);

        let search = Paragraph::new(self.search.line(self.notice.is_none()))
            .block(Block::default().borders(Borders::ALL).title(" Search "));
        f.render_widget(search, chunks[1]);

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|entry| ListItem::new(entry.display()))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Messages ({}) ", self.items.len())),
            )
            .highlight_style(highlight_style())
            .highlight_symbol("> ");
        f.render_stateful_widget(list, chunks[2], &mut self.list_state);

        let help = Paragraph::new(
            "Enter: paste | ←/→: group | type to search | Ctrl+E: manage | Esc: close",
        )
        .style(HELP_STYLE);
        f.render_widget(help, chunks[3]);

        if let Some(notice) = &self.notice {
            render_notice(f, notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_keys::*;
    use clipbuddy_core::{Groups, Mutation};
    use ratatui::{backend::TestBackend, Terminal};

    fn store() -> Store {
        let mut groups = Groups::new();
        groups.insert(
            "Ventas".to_string(),
            vec!["Precio final".to_string(), "Envío gratis".to_string()],
        );
        groups.insert(
            "General".to_string(),
            vec!["Hola\nbuenas".to_string()],
        );
        Store::in_memory(groups)
    }

    fn opened(store: &Store) -> QuickPaste {
        let mut view = QuickPaste::new();
        view.refresh(store).unwrap();
        view
    }

    fn type_text(view: &mut QuickPaste, text: &str, store: &Store) {
        for c in text.chars() {
            view.handle_key(&ch(c), store);
        }
    }

    #[test]
    fn starts_on_all_messages_with_every_entry() {
        let store = store();
        let view = opened(&store);
        assert_eq!(view.selected_group(), &GroupRef::All);
        assert_eq!(view.items().len(), 3);
        assert_eq!(view.selected().unwrap().text, "Precio final");
    }

    #[test]
    fn typing_filters_and_enter_pastes_the_verbatim_text() {
        let store = store();
        let mut view = opened(&store);
        type_text(&mut view, "BUENAS", &store);
        assert_eq!(view.items().len(), 1);
        assert_eq!(
            view.handle_key(&key(KeyCode::Enter), &store),
            ViewAction::Paste("Hola\nbuenas".to_string())
        );
    }

    #[test]
    fn arrows_cycle_groups_in_sorted_order() {
        let store = store();
        let mut view = opened(&store);
        view.handle_key(&key(KeyCode::Right), &store);
        assert_eq!(view.selected_group(), &GroupRef::real("General"));
        view.handle_key(&key(KeyCode::Right), &store);
        assert_eq!(view.selected_group(), &GroupRef::real("Ventas"));
        view.handle_key(&key(KeyCode::Right), &store);
        assert_eq!(view.selected_group(), &GroupRef::All);
        view.handle_key(&key(KeyCode::Left), &store);
        assert_eq!(view.selected_group(), &GroupRef::real("Ventas"));
        assert_eq!(view.items().len(), 2);
    }

    #[test]
    fn empty_filter_shows_a_notice_instead_of_pasting() {
        let store = store();
        let mut view = opened(&store);
        type_text(&mut view, "zzz", &store);
        assert_eq!(view.handle_key(&key(KeyCode::Enter), &store), ViewAction::None);
        assert!(view.notice().is_some());
        // any key dismisses the notice
        view.handle_key(&ch('x'), &store);
        assert!(view.notice().is_none());
        assert_eq!(view.search(), "zzz");
    }

    #[test]
    fn falls_back_to_all_messages_when_its_group_is_deleted() {
        let mut store = store();
        let mut view = opened(&store);
        view.handle_key(&key(KeyCode::Right), &store);
        store
            .apply(Mutation::DeleteGroup("General".to_string()))
            .unwrap();
        view.refresh(&store).unwrap();
        assert_eq!(view.selected_group(), &GroupRef::All);
        assert_eq!(view.items().len(), 2);
    }

    #[test]
    fn selection_is_clamped_after_a_delete() {
        let mut store = store();
        let mut view = opened(&store);
        view.handle_key(&key(KeyCode::Down), &store);
        view.handle_key(&key(KeyCode::Down), &store);
        assert_eq!(view.selected().unwrap().group, "General");
        let entry = view.selected().unwrap().clone();
        store.apply(Mutation::DeleteMessage(entry)).unwrap();
        view.refresh(&store).unwrap();
        assert_eq!(view.selected().unwrap().text, "Envío gratis");
    }

    #[test]
    fn escape_closes_and_ctrl_e_opens_the_manager() {
        let store = store();
        let mut view = opened(&store);
        assert_eq!(view.handle_key(&ctrl('e'), &store), ViewAction::OpenManager);
        assert_eq!(view.handle_key(&key(KeyCode::Esc), &store), ViewAction::Close);
    }

    #[test]
    fn renders_entries_on_a_single_line() {
        let store = store();
        let mut view = opened(&store);
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| view.render(f, f.area())).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("Todos Los mensajes"));
        assert!(screen.contains("[General] Hola ⏎ buenas"));
    }
}
