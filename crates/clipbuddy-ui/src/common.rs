use clipbuddy_core::{BuddyError, ErrorKind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Key hints shown at the bottom of every view.
pub const HELP_STYLE: Style = Style::new().fg(Color::DarkGray);

pub fn title_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

pub fn highlight_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// Colour used when reporting an error of `kind`.
pub fn error_color(kind: ErrorKind) -> Color {
    match kind {
        ErrorKind::Validation | ErrorKind::NotFound => Color::Yellow,
        ErrorKind::Format | ErrorKind::Io | ErrorKind::Platform => Color::Red,
    }
}

/// A one-off message for the user, rendered as a popup or a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub color: Color,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            color: Color::Green,
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            color: Color::Yellow,
        }
    }

    pub fn error(title: impl Into<String>, err: &BuddyError) -> Self {
        Self {
            title: title.into(),
            message: err.to_string(),
            color: error_color(err.kind()),
        }
    }
}

// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// A centered rect of fixed height, clamped to `r`.
pub fn centered_box(percent_x: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let width = ((r.width as u32 * percent_x as u32) / 100) as u16;
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}

/// Single-line text field with a char-based cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len())
    }

    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index();
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    /// Insert pasted text; line breaks collapse to spaces.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\r' => {}
                '\n' => self.insert(' '),
                c => self.insert(c),
            }
        }
    }

    /// Apply an editing key. Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('u') {
                self.clear();
                return true;
            }
            return false;
        }
        match key.code {
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let idx = self.byte_index();
                    self.value.remove(idx);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.value.chars().count() {
                    let idx = self.byte_index();
                    self.value.remove(idx);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.value.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.value.chars().count(),
            _ => return false,
        }
        true
    }

    /// Render as a line, drawing the cursor as a reversed cell when focused.
    pub fn line(&self, focused: bool) -> Line<'_> {
        if !focused {
            return Line::from(self.value.as_str());
        }
        let idx = self.byte_index();
        let (before, rest) = self.value.split_at(idx);
        let mut chars = rest.chars();
        let at_cursor = chars.next().map(String::from).unwrap_or_else(|| " ".into());
        let after = chars.as_str();
        Line::from(vec![
            Span::raw(before),
            Span::styled(
                at_cursor,
                Style::default().add_modifier(Modifier::REVERSED),
            ),
            Span::raw(after),
        ])
    }
}

pub(crate) fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}
