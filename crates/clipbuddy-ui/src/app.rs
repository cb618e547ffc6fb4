//! The owner loop: one thread holds the store and every open view, and all
//! input (terminal keys, global shortcuts) reaches it as [`AppEvent`]s.

use crate::common::{error_color, is_ctrl, title_style, Notice, HELP_STYLE};
use crate::manager::Manager;
use crate::quick_paste::QuickPaste;
use crate::view::{TerminalView, ViewAction};
use clipbuddy_core::{
    paste_text, ImportMode, Mutation, PasteOutcome, Registration, Result, SnippetHub, ViewHandle,
    ViewKind,
};
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::cell::RefCell;
use std::io::stdout;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Open the view of this kind, or focus it if it is already open.
    Open(ViewKind),
    Input(Event),
    Quit,
}

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub popup_hotkey: String,
    pub manager_hotkey: String,
    pub open_on_start: Option<ViewKind>,
    /// Leave the app once the last view closes (one-shot `popup`/`manage`).
    pub exit_when_closed: bool,
}

struct Slot<V> {
    handle: ViewHandle,
    view: Rc<RefCell<V>>,
}

pub struct App {
    hub: SnippetHub,
    options: AppOptions,
    quick_paste: Option<Slot<QuickPaste>>,
    manager: Option<Slot<Manager>>,
    focus: Option<ViewKind>,
    status: Option<Notice>,
    exiting: bool,
}

impl App {
    pub fn new(hub: SnippetHub, options: AppOptions) -> Self {
        Self {
            hub,
            options,
            quick_paste: None,
            manager: None,
            focus: None,
            status: None,
            exiting: false,
        }
    }

    pub fn hub(&self) -> &SnippetHub {
        &self.hub
    }

    pub fn focus(&self) -> Option<ViewKind> {
        self.focus
    }

    pub fn status(&self) -> Option<&Notice> {
        self.status.as_ref()
    }

    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    pub fn is_open(&self, kind: ViewKind) -> bool {
        match kind {
            ViewKind::QuickPaste => self.quick_paste.is_some(),
            ViewKind::Manager => self.manager.is_some(),
        }
    }

    fn open_kinds(&self) -> Vec<ViewKind> {
        [ViewKind::QuickPaste, ViewKind::Manager]
            .into_iter()
            .filter(|kind| self.is_open(*kind))
            .collect()
    }

    fn view(&self, kind: ViewKind) -> Option<Rc<RefCell<dyn TerminalView>>> {
        match kind {
            ViewKind::QuickPaste => self
                .quick_paste
                .as_ref()
                .map(|slot| slot.view.clone() as Rc<RefCell<dyn TerminalView>>),
            ViewKind::Manager => self
                .manager
                .as_ref()
                .map(|slot| slot.view.clone() as Rc<RefCell<dyn TerminalView>>),
        }
    }

    /// Open a view of `kind`. A second request while one is open only
    /// focuses the existing view.
    pub fn open(&mut self, kind: ViewKind) -> Result<()> {
        let registration = match kind {
            ViewKind::QuickPaste => {
                let view = Rc::new(RefCell::new(QuickPaste::new()));
                let registration = self.hub.open_view(&view)?;
                if let Registration::Registered(handle) = registration {
                    self.quick_paste = Some(Slot { handle, view });
                }
                registration
            }
            ViewKind::Manager => {
                let view = Rc::new(RefCell::new(Manager::new()));
                let registration = self.hub.open_view(&view)?;
                if let Registration::Registered(handle) = registration {
                    self.manager = Some(Slot { handle, view });
                }
                registration
            }
        };
        match registration {
            Registration::Registered(_) => tracing::info!("opened {} view", kind),
            Registration::AlreadyOpen(_) => tracing::debug!("{} view already open, focusing it", kind),
        }
        self.focus = Some(kind);
        Ok(())
    }

    pub fn close(&mut self, kind: ViewKind) {
        let handle = match kind {
            ViewKind::QuickPaste => self.quick_paste.take().map(|slot| slot.handle),
            ViewKind::Manager => self.manager.take().map(|slot| slot.handle),
        };
        if let Some(handle) = handle {
            self.hub.close_view(handle);
            tracing::info!("closed {} view", kind);
        }
        if self.focus == Some(kind) {
            self.focus = self.open_kinds().into_iter().next();
        }
        if self.focus.is_none() && self.options.exit_when_closed {
            self.exiting = true;
        }
    }

    fn cycle_focus(&mut self) {
        let open = self.open_kinds();
        if open.is_empty() {
            return;
        }
        let next = match self.focus.and_then(|kind| open.iter().position(|k| *k == kind)) {
            Some(idx) => open[(idx + 1) % open.len()],
            None => open[0],
        };
        self.focus = Some(next);
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Open(kind) => self.open(kind)?,
            AppEvent::Quit => self.exiting = true,
            AppEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key)?
            }
            AppEvent::Input(Event::Paste(text)) => {
                if let Some(view) = self.focus.and_then(|kind| self.view(kind)) {
                    view.borrow_mut().handle_paste(&text, self.hub.store());
                }
            }
            AppEvent::Input(_) => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if is_ctrl(&key, 'c') {
            self.exiting = true;
            return Ok(());
        }
        if key.code == KeyCode::F(2) {
            self.cycle_focus();
            return Ok(());
        }

        let Some(kind) = self.focus else {
            return self.handle_idle_key(key);
        };
        let Some(view) = self.view(kind) else {
            self.focus = None;
            return Ok(());
        };
        self.status = None;

        let action = view.borrow_mut().handle_key(&key, self.hub.store());
        self.perform(kind, &view, action)
    }

    fn handle_idle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('p') => self.open(ViewKind::QuickPaste)?,
            KeyCode::Char('m') => self.open(ViewKind::Manager)?,
            KeyCode::Char('q') | KeyCode::Esc => self.exiting = true,
            _ => {}
        }
        Ok(())
    }

    fn perform(
        &mut self,
        kind: ViewKind,
        view: &Rc<RefCell<dyn TerminalView>>,
        action: ViewAction,
    ) -> Result<()> {
        match action {
            ViewAction::None => {}
            ViewAction::Close => self.close(kind),
            ViewAction::OpenManager => self.open(ViewKind::Manager)?,
            ViewAction::Commit(mutation) => {
                // The view must not be borrowed while every view refreshes
                let result = self.hub.commit(mutation);
                view.borrow_mut().after_commit(&result, self.hub.store());
            }
            ViewAction::Paste(text) => self.paste(&text),
            ViewAction::Export(path) => {
                let notice = self.export(&path);
                view.borrow_mut().report(notice);
            }
            ViewAction::Import { path, mode } => {
                let notice = self.import(&path, mode);
                view.borrow_mut().report(notice);
            }
        }
        Ok(())
    }

    fn paste(&mut self, text: &str) {
        // Withdraw the popup first so focus goes back to where the user was typing
        self.close(ViewKind::QuickPaste);
        self.status = Some(match paste_text(text) {
            Ok(PasteOutcome::Pasted) => Notice::info("Paste", PasteOutcome::Pasted.message()),
            Ok(outcome) => Notice::warning("Paste", outcome.message()),
            Err(err) => Notice::error("Paste failed", &err),
        });
    }

    fn export(&self, path: &Path) -> Notice {
        let store = self.hub.store();
        match store.export_csv(path) {
            Ok(()) => Notice::info(
                "Exported",
                format!(
                    "Wrote {} messages to {}",
                    store.message_count(),
                    path.display()
                ),
            ),
            Err(err) => Notice::error("Export failed", &err),
        }
    }

    /// Read `path` and commit it only if every row was read.
    fn import(&mut self, path: &Path, mode: ImportMode) -> Notice {
        let import = match self.hub.store().read_import(path, mode) {
            Ok(import) => import,
            Err(err) => return Notice::error("Import failed", &err),
        };
        if let Some(err) = &import.error {
            tracing::warn!("import of {} not committed: {}", path.display(), err);
            return Notice {
                title: "Import stopped".to_string(),
                message: format!("{}\nNothing was changed.", err),
                color: error_color(err.kind()),
            };
        }

        let summary = import.summary();
        match self.hub.commit(Mutation::ReplaceAll(import.groups)) {
            Ok(_) => Notice::info("Imported", summary),
            Err(err) => Notice::error("Import not saved", &err),
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(f.area());

        match self.focus.and_then(|kind| self.view(kind)) {
            Some(view) => {
                view.borrow_mut().render(f, chunks[0]);
            }
            None => self.render_idle(f, chunks[0]),
        }
        self.render_status(f, chunks[1]);
    }

    fn render_idle(&self, f: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title area
                Constraint::Min(6),    // Shortcuts and data
                Constraint::Length(1), // Help text
            ])
            .split(area);

        let version = env!("CARGO_PKG_VERSION");
        let title = Paragraph::new(format!("clipbuddy v{}", version))
            .style(title_style())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, rows[0]);

        let store = self.hub.store();
        let data_file = store
            .path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(in memory)".to_string());
        let key_style = Style::default().fg(Color::Yellow);
        let body = vec![
            Line::from(vec![
                Span::raw("Quick paste: "),
                Span::styled(self.options.popup_hotkey.clone(), key_style),
            ]),
            Line::from(vec![
                Span::raw("Manage groups: "),
                Span::styled(self.options.manager_hotkey.clone(), key_style),
            ]),
            Line::from(""),
            Line::from(format!(
                "{} groups, {} messages",
                store.groups().len(),
                store.message_count()
            )),
            Line::from(Span::styled(format!("Data: {}", data_file), HELP_STYLE)),
        ];
        let body = Paragraph::new(body)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Shortcuts "));
        f.render_widget(body, rows[1]);

        let help = Paragraph::new("p: quick paste | m: manage groups | q: quit").style(HELP_STYLE);
        f.render_widget(help, rows[2]);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for kind in self.open_kinds() {
            let style = if self.focus == Some(kind) {
                title_style()
            } else {
                HELP_STYLE
            };
            spans.push(Span::styled(format!("[{}] ", kind), style));
        }
        if spans.len() > 1 {
            spans.push(Span::styled("F2: switch  ", HELP_STYLE));
        }
        if let Some(status) = &self.status {
            spans.push(Span::styled(
                status.message.clone(),
                Style::default().fg(status.color),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Draw, then block on the next event, until asked to exit.
    pub fn run<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &Receiver<AppEvent>,
    ) -> Result<()> {
        if let Some(kind) = self.options.open_on_start {
            self.open(kind)?;
        }
        while !self.exiting {
            terminal.draw(|f| self.render(f))?;
            let Ok(event) = events.recv() else {
                tracing::info!("all event sources are gone, exiting");
                break;
            };
            if let Err(err) = self.handle_event(event) {
                tracing::error!("event failed: {}", err);
                self.status = Some(Notice::error("Error", &err));
            }
        }
        Ok(())
    }
}

/// Forward terminal input to the owner loop from a dedicated thread.
pub fn spawn_input_reader(sender: Sender<AppEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        match event::read() {
            Ok(event) => {
                if sender.send(AppEvent::Input(event)).is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::error!("terminal input failed: {}", err);
                let _ = sender.send(AppEvent::Quit);
                break;
            }
        }
    })
}

/// Run the interactive application on the current terminal.
///
/// `sender` is cloned into the terminal input reader; global shortcut
/// listeners should hold their own clones.
pub fn run_app(
    hub: SnippetHub,
    sender: Sender<AppEvent>,
    events: Receiver<AppEvent>,
    options: AppOptions,
) -> Result<()> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    spawn_input_reader(sender);
    let mut app = App::new(hub, options);
    let result = app.run(&mut terminal, &events);

    // Clean up terminal
    disable_raw_mode()?;
    execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen)?;

    result
}
