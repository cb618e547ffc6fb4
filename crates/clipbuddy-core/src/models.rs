use crate::config::ALL_MESSAGES;
use indexmap::IndexMap;
use std::fmt;

/// Group name → ordered messages, in store (insertion) order.
pub type Groups = IndexMap<String, Vec<String>>;

/// Marker shown in single-line renderings where the text has a line break.
pub const LINE_BREAK_MARKER: &str = " ⏎ ";

/// A group as addressed by a view: either the virtual aggregate or a real group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum GroupRef {
    #[default]
    All,
    Real(String),
}

impl GroupRef {
    /// Parse a name typed or picked by the user. The reserved name maps to `All`.
    pub fn parse(name: &str) -> Self {
        if name == ALL_MESSAGES {
            GroupRef::All
        } else {
            GroupRef::Real(name.to_string())
        }
    }

    pub fn real(name: impl Into<String>) -> Self {
        GroupRef::Real(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            GroupRef::All => ALL_MESSAGES,
            GroupRef::Real(name) => name,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, GroupRef::All)
    }
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A message as returned by a query: where it lives and its verbatim text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    pub group: String,
    pub position: usize,
    pub text: String,
    /// Prefix the source group in the display form (virtual group listings).
    pub show_group: bool,
}

impl MessageEntry {
    pub fn new(group: impl Into<String>, position: usize, text: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            position,
            text: text.into(),
            show_group: false,
        }
    }

    /// Single-line form used by list widgets.
    pub fn display(&self) -> String {
        if self.show_group {
            format!("[{}] {}", self.group, single_line(&self.text))
        } else {
            single_line(&self.text)
        }
    }
}

/// Normalize CRLF/CR to LF and replace every line break with the marker.
pub fn single_line(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', LINE_BREAK_MARKER)
}

/// A committed change to the store, produced by views and the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    AddGroup(String),
    RenameGroup { from: String, to: String },
    DeleteGroup(String),
    AddMessage { group: String, text: String },
    EditMessage { entry: MessageEntry, text: String },
    DeleteMessage(MessageEntry),
    ReplaceAll(Groups),
}

impl Mutation {
    /// Short label for logs and notices.
    pub fn describe(&self) -> String {
        match self {
            Mutation::AddGroup(name) => format!("add group '{}'", name),
            Mutation::RenameGroup { from, to } => format!("rename group '{}' to '{}'", from, to),
            Mutation::DeleteGroup(name) => format!("delete group '{}'", name),
            Mutation::AddMessage { group, .. } => format!("add message to '{}'", group),
            Mutation::EditMessage { entry, .. } => {
                format!("edit message {} of '{}'", entry.position, entry.group)
            }
            Mutation::DeleteMessage(entry) => {
                format!("delete message {} of '{}'", entry.position, entry.group)
            }
            Mutation::ReplaceAll(groups) => format!("replace all data ({} groups)", groups.len()),
        }
    }
}

/// Dataset written on first run.
pub fn default_groups() -> Groups {
    let mut groups = Groups::new();
    groups.insert(
        "General".to_string(),
        vec![
            "¡Gracias por tu compra!".to_string(),
            "¿Cómo puedo ayudarte?".to_string(),
            "Te paso el link en un momento.".to_string(),
        ],
    );
    groups.insert(
        "Ventas".to_string(),
        vec![
            "Promo: membresía $5/mes con cursos, comunidad y calculadoras.".to_string(),
            "Envío en 24-48 h hábiles.".to_string(),
            "Stock disponible, ¡aprovechá!".to_string(),
        ],
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_name_parses_to_all() {
        assert_eq!(GroupRef::parse(ALL_MESSAGES), GroupRef::All);
        assert_eq!(GroupRef::parse("Ventas"), GroupRef::real("Ventas"));
        // case-sensitive: only the exact name is reserved
        assert_eq!(
            GroupRef::parse("todos los mensajes"),
            GroupRef::real("todos los mensajes")
        );
        assert_eq!(GroupRef::All.to_string(), ALL_MESSAGES);
    }

    #[test]
    fn single_line_marks_every_break_style() {
        assert_eq!(single_line("a\r\nb\rc\nd"), "a ⏎ b ⏎ c ⏎ d");
        assert_eq!(single_line("plain"), "plain");
    }

    #[test]
    fn display_prefixes_group_only_when_asked() {
        let mut entry = MessageEntry::new("Ventas", 0, "hola\nchau");
        assert_eq!(entry.display(), "hola ⏎ chau");
        entry.show_group = true;
        assert_eq!(entry.display(), "[Ventas] hola ⏎ chau");
        // the underlying value keeps its real line break
        assert_eq!(entry.text, "hola\nchau");
    }

    #[test]
    fn default_dataset_has_two_groups() {
        let groups = default_groups();
        assert_eq!(
            groups.keys().collect::<Vec<_>>(),
            vec!["General", "Ventas"]
        );
        assert!(groups.values().all(|messages| messages.len() == 3));
    }
}
