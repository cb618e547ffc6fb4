//! Small modal dialogs shared by the views.

use crate::common::{centered_box, Notice, TextInput, HELP_STYLE};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome<T> {
    Pending,
    Done(T),
    Cancelled,
}

/// Free-text prompt. Enter submits the trimmed value; Esc cancels.
#[derive(Debug, Clone)]
pub struct Prompt {
    title: String,
    label: String,
    input: TextInput,
}

impl Prompt {
    pub fn new(title: impl Into<String>, label: impl Into<String>, initial: &str) -> Self {
        Self {
            title: title.into(),
            label: label.into(),
            input: TextInput::new(initial),
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn insert_str(&mut self, text: &str) {
        self.input.insert_str(text);
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> DialogOutcome<String> {
        match key.code {
            KeyCode::Enter => DialogOutcome::Done(self.input.value().trim().to_string()),
            KeyCode::Esc => DialogOutcome::Cancelled,
            _ => {
                self.input.handle_key(key);
                DialogOutcome::Pending
            }
        }
    }

    pub fn render(&self, f: &mut Frame) {
        let area = centered_box(60, 7, f.area());
        f.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);
        f.render_widget(Paragraph::new(self.label.as_str()), rows[0]);
        f.render_widget(
            Paragraph::new(self.input.line(true)).block(Block::default().borders(Borders::ALL)),
            rows[1],
        );
        f.render_widget(
            Paragraph::new("Enter: accept | Esc: cancel").style(HELP_STYLE),
            rows[2],
        );
    }
}

/// Yes/no question.
#[derive(Debug, Clone)]
pub struct Confirm {
    title: String,
    question: String,
}

impl Confirm {
    pub fn new(title: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            question: question.into(),
        }
    }

    pub fn handle_key(&self, key: &KeyEvent) -> DialogOutcome<()> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => DialogOutcome::Done(()),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => DialogOutcome::Cancelled,
            _ => DialogOutcome::Pending,
        }
    }

    pub fn render(&self, f: &mut Frame) {
        render_box(
            f,
            &self.title,
            Color::Yellow,
            vec![
                Line::from(self.question.as_str()),
                Line::from(""),
                Line::from(Span::styled("y: yes | n: no", HELP_STYLE)),
            ],
        );
    }
}

/// Pick one of two options by its key letter.
#[derive(Debug, Clone)]
pub struct Choice<T: Copy> {
    title: String,
    question: String,
    options: [(char, &'static str, T); 2],
}

impl<T: Copy> Choice<T> {
    pub fn new(
        title: impl Into<String>,
        question: impl Into<String>,
        options: [(char, &'static str, T); 2],
    ) -> Self {
        Self {
            title: title.into(),
            question: question.into(),
            options,
        }
    }

    pub fn handle_key(&self, key: &KeyEvent) -> DialogOutcome<T> {
        match key.code {
            KeyCode::Esc => DialogOutcome::Cancelled,
            KeyCode::Char(c) => self
                .options
                .iter()
                .find(|(letter, _, _)| letter.eq_ignore_ascii_case(&c))
                .map(|(_, _, value)| DialogOutcome::Done(*value))
                .unwrap_or(DialogOutcome::Pending),
            _ => DialogOutcome::Pending,
        }
    }

    pub fn render(&self, f: &mut Frame) {
        let mut hints: Vec<Span> = Vec::new();
        for (letter, label, _) in &self.options {
            hints.push(Span::styled(
                format!("{}", letter),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            hints.push(Span::raw(format!(": {} | ", label)));
        }
        hints.push(Span::styled("Esc: cancel", HELP_STYLE));
        render_box(
            f,
            &self.title,
            Color::Cyan,
            vec![
                Line::from(self.question.as_str()),
                Line::from(""),
                Line::from(hints),
            ],
        );
    }
}

pub fn render_notice(f: &mut Frame, notice: &Notice) {
    let mut lines: Vec<Line> = notice
        .message
        .lines()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(notice.color))))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Press any key to continue...", HELP_STYLE)));
    render_box(f, &notice.title, notice.color, lines);
}

fn render_box(f: &mut Frame, title: &str, color: Color, lines: Vec<Line>) {
    let height = lines.len() as u16 + 4;
    let area = centered_box(60, height, f.area());
    f.render_widget(Clear, area);
    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title))
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(body, area);
}
