use crate::common::{centered_rect, is_ctrl, HELP_STYLE};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const MAX_LINES: usize = 10000;
const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    Continue,
    Save(String),
    Cancel,
}

/// Multiline message editor.
///
/// Enter inserts a line break; Ctrl+S or Ctrl+W saves; Esc cancels. Saving
/// content that is only whitespace asks for confirmation first.
#[derive(Debug, Clone)]
pub struct MessageEditor {
    title: String,
    lines: Vec<String>,
    current_line: usize,
    cursor_pos: usize,
    confirming_empty: bool,
}

impl MessageEditor {
    pub fn new(title: impl Into<String>, initial: &str) -> Self {
        let lines: Vec<String> = initial.split('\n').map(str::to_string).collect();
        let current_line = lines.len() - 1;
        let cursor_pos = lines[current_line].chars().count();
        Self {
            title: title.into(),
            lines,
            current_line,
            cursor_pos,
            confirming_empty: false,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_confirming_empty(&self) -> bool {
        self.confirming_empty
    }

    fn line_len(&self) -> usize {
        self.lines[self.current_line].chars().count()
    }

    fn byte_index(&self) -> usize {
        let line = &self.lines[self.current_line];
        line.char_indices()
            .nth(self.cursor_pos)
            .map(|(idx, _)| idx)
            .unwrap_or(line.len())
    }

    fn insert_char(&mut self, c: char) {
        let idx = self.byte_index();
        self.lines[self.current_line].insert(idx, c);
        self.cursor_pos += 1;
    }

    fn split_line(&mut self) {
        if self.lines.len() >= MAX_LINES {
            return;
        }
        let idx = self.byte_index();
        let rest = self.lines[self.current_line].split_off(idx);
        self.current_line += 1;
        self.lines.insert(self.current_line, rest);
        self.cursor_pos = 0;
    }

    /// Insert pasted text at the cursor, keeping its line breaks.
    pub fn insert_str(&mut self, text: &str) {
        let mut first = true;
        for segment in text.split('\n') {
            if !first {
                self.split_line();
            }
            first = false;
            for c in segment.chars() {
                self.insert_char(c);
            }
        }
    }

    fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let idx = self.byte_index();
            self.lines[self.current_line].remove(idx);
        } else if self.current_line > 0 {
            let line = self.lines.remove(self.current_line);
            self.current_line -= 1;
            self.cursor_pos = self.line_len();
            self.lines[self.current_line].push_str(&line);
        }
    }

    fn delete(&mut self) {
        if self.cursor_pos < self.line_len() {
            let idx = self.byte_index();
            self.lines[self.current_line].remove(idx);
        } else if self.current_line + 1 < self.lines.len() {
            let next = self.lines.remove(self.current_line + 1);
            self.lines[self.current_line].push_str(&next);
        }
    }

    fn move_vertical(&mut self, down: bool) {
        if down && self.current_line + 1 < self.lines.len() {
            self.current_line += 1;
        } else if !down && self.current_line > 0 {
            self.current_line -= 1;
        }
        self.cursor_pos = self.cursor_pos.min(self.line_len());
    }

    fn save(&mut self) -> EditorOutcome {
        let text = self.text();
        if text.trim().is_empty() {
            self.confirming_empty = true;
            return EditorOutcome::Continue;
        }
        EditorOutcome::Save(text)
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> EditorOutcome {
        if self.confirming_empty {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirming_empty = false;
                    return EditorOutcome::Save(self.text());
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirming_empty = false;
                }
                _ => {}
            }
            return EditorOutcome::Continue;
        }

        if is_ctrl(key, 's') || is_ctrl(key, 'w') {
            return self.save();
        }
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return EditorOutcome::Continue;
        }

        match key.code {
            KeyCode::Esc => return EditorOutcome::Cancel,
            KeyCode::Enter => self.split_line(),
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Tab => {
                for _ in 0..TAB_WIDTH {
                    self.insert_char(' ');
                }
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                } else if self.current_line > 0 {
                    self.current_line -= 1;
                    self.cursor_pos = self.line_len();
                }
            }
            KeyCode::Right => {
                if self.cursor_pos < self.line_len() {
                    self.cursor_pos += 1;
                } else if self.current_line + 1 < self.lines.len() {
                    self.current_line += 1;
                    self.cursor_pos = 0;
                }
            }
            KeyCode::Up => self.move_vertical(false),
            KeyCode::Down => self.move_vertical(true),
            KeyCode::Home => self.cursor_pos = 0,
            KeyCode::End => self.cursor_pos = self.line_len(),
            _ => {}
        }
        EditorOutcome::Continue
    }

    pub fn render(&self, f: &mut Frame) {
        let area = centered_rect(80, 70, f.area());
        f.render_widget(Clear, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(chunks[0]);

        // Keep the cursor inside the visible window
        let height = inner.height.max(1) as usize;
        let width = inner.width.max(1) as usize;
        let scroll_y = self.current_line.saturating_sub(height - 1);
        let scroll_x = self.cursor_pos.saturating_sub(width - 1);

        let text: Vec<Line> = self.lines.iter().map(|l| Line::from(l.as_str())).collect();
        let body = Paragraph::new(text)
            .block(block)
            .scroll((scroll_y as u16, scroll_x as u16));
        f.render_widget(body, chunks[0]);

        if !self.confirming_empty {
            f.set_cursor_position(Position::new(
                inner.x + (self.cursor_pos - scroll_x) as u16,
                inner.y + (self.current_line - scroll_y) as u16,
            ));
        }

        let footer = if self.confirming_empty {
            Paragraph::new("The message is empty. Save anyway? (y/n)")
                .style(Style::default().fg(Color::Yellow))
        } else {
            Paragraph::new(format!(
                "Ctrl+S/Ctrl+W: save | Esc: cancel | line {}/{}",
                self.current_line + 1,
                self.lines.len()
            ))
            .style(HELP_STYLE)
        };
        f.render_widget(footer, chunks[1]);
    }
}
