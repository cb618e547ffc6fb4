use crate::codec;
use crate::config::ALL_MESSAGES;
use crate::csv_codec::{self, CsvImport, ImportMode};
use crate::error::{BuddyError, Result};
use crate::models::{default_groups, GroupRef, Groups, MessageEntry, Mutation};
use std::path::{Path, PathBuf};

/// What a committed mutation changed, for views that want to move their
/// selection along with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    GroupAdded(String),
    GroupRenamed { from: String, to: String },
    GroupDeleted { name: String, existed: bool },
    MessageAdded { group: String, position: usize },
    MessageEdited { group: String, position: usize },
    MessageDeleted { group: String, position: usize },
    Replaced { groups: usize },
    Unchanged,
}

/// The snippet store: group name → ordered messages.
///
/// Every mutation writes the whole mapping back to `path` before returning.
/// A failed write is reported as an error but the in-memory change stays.
#[derive(Debug, Clone)]
pub struct Store {
    groups: Groups,
    path: Option<PathBuf>,
}

impl Store {
    /// Load the store from `path`, writing the default dataset if the file
    /// does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let store = match codec::read_file(&path)? {
            Some(groups) => {
                tracing::info!("loaded {} groups from {}", groups.len(), path.display());
                Self {
                    groups,
                    path: Some(path),
                }
            }
            None => {
                tracing::info!("no snippets file at {}, writing defaults", path.display());
                let store = Self {
                    groups: default_groups(),
                    path: Some(path),
                };
                store.save()?;
                store
            }
        };
        Ok(store)
    }

    /// An unpersisted store.
    pub fn in_memory(groups: Groups) -> Self {
        let mut groups = groups;
        groups.shift_remove(ALL_MESSAGES);
        Self { groups, path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn message_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Write the mapping to disk. A no-op for in-memory stores.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        codec::write_file(path, &self.groups).map_err(|err| {
            tracing::error!("failed to save snippets to {}: {}", path.display(), err);
            err
        })
    }

    /// Selectable groups: the virtual group first, then real groups sorted
    /// case-insensitively.
    pub fn list_groups(&self) -> Vec<GroupRef> {
        let mut groups = Vec::with_capacity(self.groups.len() + 1);
        groups.push(GroupRef::All);
        groups.extend(
            self.sorted_group_names()
                .into_iter()
                .map(|name| GroupRef::Real(name.to_string())),
        );
        groups
    }

    /// Real group names sorted case-insensitively.
    pub fn sorted_group_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        names.sort_by_cached_key(|name| name.to_lowercase());
        names
    }

    /// Messages of `group` whose text contains `query`, ignoring case.
    ///
    /// For the virtual group the source group name is matched as well and
    /// entries are listed in store order. Unknown groups yield nothing.
    pub fn list_messages(&self, group: &GroupRef, query: &str) -> Vec<MessageEntry> {
        let query = query.trim().to_lowercase();
        let matches = |text: &str| query.is_empty() || text.to_lowercase().contains(&query);

        let entries: Vec<MessageEntry> = match group {
            GroupRef::All => self
                .groups
                .iter()
                .flat_map(|(name, messages)| {
                    let group_matches = matches(name);
                    messages
                        .iter()
                        .enumerate()
                        .filter(move |(_, text)| group_matches || matches(text.as_str()))
                        .map(move |(position, text)| MessageEntry {
                            group: name.clone(),
                            position,
                            text: text.clone(),
                            show_group: true,
                        })
                })
                .collect(),
            GroupRef::Real(name) => match self.groups.get(name) {
                Some(messages) => messages
                    .iter()
                    .enumerate()
                    .filter(|(_, text)| matches(text.as_str()))
                    .map(|(position, text)| MessageEntry::new(name.clone(), position, text.clone()))
                    .collect(),
                None => Vec::new(),
            },
        };
        tracing::debug!(
            "query {:?} in '{}' matched {} messages",
            query,
            group,
            entries.len()
        );
        entries
    }

    fn validate_name(&self, name: &str, current: Option<&str>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BuddyError::Validation("group name is empty".to_string()));
        }
        if name == ALL_MESSAGES {
            return Err(BuddyError::Validation(format!(
                "'{}' is reserved for the virtual group",
                ALL_MESSAGES
            )));
        }
        if self.groups.contains_key(name) && current != Some(name) {
            return Err(BuddyError::Validation(format!(
                "a group named '{}' already exists",
                name
            )));
        }
        Ok(name.to_string())
    }

    pub fn add_group(&mut self, name: &str) -> Result<String> {
        let name = self.validate_name(name, None)?;
        self.groups.insert(name.clone(), Vec::new());
        self.save()?;
        Ok(name)
    }

    /// Rename `old` to `new`, keeping its messages. Renaming to the same name
    /// is a no-op. The renamed group moves to the end of store order.
    pub fn rename_group(&mut self, old: &str, new: &str) -> Result<String> {
        if !self.groups.contains_key(old) {
            return Err(BuddyError::GroupNotFound(old.to_string()));
        }
        let new = self.validate_name(new, Some(old))?;
        if new == old {
            return Ok(new);
        }
        let messages = self.groups.shift_remove(old).unwrap_or_default();
        self.groups.insert(new.clone(), messages);
        self.save()?;
        Ok(new)
    }

    /// Remove a group and all its messages. Returns whether it existed.
    pub fn delete_group(&mut self, name: &str) -> Result<bool> {
        if self.groups.shift_remove(name).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn real_group_mut(&mut self, group: &str) -> Result<&mut Vec<String>> {
        if group == ALL_MESSAGES {
            return Err(BuddyError::GroupNotFound(format!(
                "'{}' is virtual, pick a real group",
                ALL_MESSAGES
            )));
        }
        self.groups
            .get_mut(group)
            .ok_or_else(|| BuddyError::GroupNotFound(group.to_string()))
    }

    pub fn contains_message(&self, group: &str, text: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|messages| messages.iter().any(|message| message == text))
    }

    /// Append `text` verbatim. Returns its position.
    pub fn add_message(&mut self, group: &str, text: &str) -> Result<usize> {
        let messages = self.real_group_mut(group)?;
        messages.push(text.to_string());
        let position = messages.len() - 1;
        self.save()?;
        Ok(position)
    }

    fn checked_slot(&mut self, group: &str, position: usize) -> Result<&mut String> {
        let messages = self.real_group_mut(group)?;
        let len = messages.len();
        messages
            .get_mut(position)
            .ok_or_else(|| BuddyError::MessageIndex {
                group: group.to_string(),
                index: position,
                len,
            })
    }

    pub fn edit_message(&mut self, group: &str, position: usize, text: &str) -> Result<()> {
        let slot = self.checked_slot(group, position)?;
        *slot = text.to_string();
        self.save()
    }

    pub fn delete_message(&mut self, group: &str, position: usize) -> Result<String> {
        self.checked_slot(group, position)?;
        let removed = self.real_group_mut(group)?.remove(position);
        self.save()?;
        Ok(removed)
    }

    /// Re-validate an entry taken from an earlier query against current state.
    ///
    /// Returns the entry's position if its text is still there, otherwise the
    /// first position holding the same text.
    pub fn locate(&self, entry: &MessageEntry) -> Result<usize> {
        let messages = self
            .groups
            .get(&entry.group)
            .ok_or_else(|| BuddyError::GroupNotFound(entry.group.clone()))?;
        if messages.get(entry.position) == Some(&entry.text) {
            return Ok(entry.position);
        }
        messages
            .iter()
            .position(|message| *message == entry.text)
            .ok_or(BuddyError::MessageIndex {
                group: entry.group.clone(),
                index: entry.position,
                len: messages.len(),
            })
    }

    /// Replace the whole mapping, e.g. with the result of a CSV import.
    pub fn replace_all(&mut self, groups: Groups) -> Result<usize> {
        let mut groups = groups;
        groups.shift_remove(ALL_MESSAGES);
        self.groups = groups;
        self.save()?;
        Ok(self.groups.len())
    }

    pub fn apply(&mut self, mutation: Mutation) -> Result<Applied> {
        match mutation {
            Mutation::AddGroup(name) => self.add_group(&name).map(Applied::GroupAdded),
            Mutation::RenameGroup { from, to } => {
                let to = self.rename_group(&from, &to)?;
                if to == from {
                    Ok(Applied::Unchanged)
                } else {
                    Ok(Applied::GroupRenamed { from, to })
                }
            }
            Mutation::DeleteGroup(name) => {
                let existed = self.delete_group(&name)?;
                Ok(Applied::GroupDeleted { name, existed })
            }
            Mutation::AddMessage { group, text } => {
                let position = self.add_message(&group, &text)?;
                Ok(Applied::MessageAdded { group, position })
            }
            Mutation::EditMessage { entry, text } => {
                let position = self.locate(&entry)?;
                self.edit_message(&entry.group, position, &text)?;
                Ok(Applied::MessageEdited {
                    group: entry.group,
                    position,
                })
            }
            Mutation::DeleteMessage(entry) => {
                let position = self.locate(&entry)?;
                self.delete_message(&entry.group, position)?;
                Ok(Applied::MessageDeleted {
                    group: entry.group,
                    position,
                })
            }
            Mutation::ReplaceAll(groups) => {
                let groups = self.replace_all(groups)?;
                Ok(Applied::Replaced { groups })
            }
        }
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        csv_codec::export_csv(&self.groups, path)
    }

    /// Read a CSV file against the current data without committing it.
    pub fn read_import(&self, path: &Path, mode: ImportMode) -> Result<CsvImport> {
        csv_codec::import_csv(path, &self.groups, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(pairs: &[(&str, &[&str])]) -> Store {
        Store::in_memory(
            pairs
                .iter()
                .map(|(name, messages)| {
                    (
                        name.to_string(),
                        messages.iter().map(|m| m.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    fn messages(store: &Store, group: &str) -> Vec<String> {
        store.group(group).unwrap().to_vec()
    }

    #[test]
    fn list_groups_puts_the_virtual_group_first_and_sorts_ignoring_case() {
        let store = store(&[("beta", &[]), ("Alpha", &[]), ("charlie", &[]), ("Bravo", &[])]);
        let names: Vec<String> = store
            .list_groups()
            .iter()
            .map(|group| group.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![ALL_MESSAGES, "Alpha", "beta", "Bravo", "charlie"]
        );
    }

    #[test]
    fn virtual_listing_concatenates_all_groups_in_store_order() {
        let store = store(&[("z", &["1", "2"]), ("a", &["3"]), ("m", &[])]);
        let all = store.list_messages(&GroupRef::All, "");
        assert_eq!(all.len(), store.message_count());
        let pairs: Vec<(&str, &str)> = all
            .iter()
            .map(|entry| (entry.group.as_str(), entry.text.as_str()))
            .collect();
        assert_eq!(pairs, vec![("z", "1"), ("z", "2"), ("a", "3")]);
        assert_eq!(all[0].display(), "[z] 1");
    }

    #[test]
    fn virtual_listing_matches_text_or_group_name() {
        let store = store(&[
            ("Ventas", &["Envío rápido", "Stock"]),
            ("General", &["¿Cómo puedo AYUDARTE?", "ventas cerradas"]),
        ]);
        let texts = |query: &str| -> Vec<String> {
            store
                .list_messages(&GroupRef::All, query)
                .into_iter()
                .map(|entry| entry.text)
                .collect()
        };
        assert_eq!(
            texts("ventas"),
            vec!["Envío rápido", "Stock", "ventas cerradas"]
        );
        assert_eq!(texts("  ayudarte "), vec!["¿Cómo puedo AYUDARTE?"]);
        assert!(texts("nothing").is_empty());
    }

    #[test]
    fn real_group_listing_matches_text_only() {
        let store = store(&[("Ventas", &["Envío", "ventas del mes", "otro"])]);
        let entries = store.list_messages(&GroupRef::real("Ventas"), "VENTAS");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].position, 1);
        assert_eq!(entries[0].display(), "ventas del mes");
        assert!(store
            .list_messages(&GroupRef::real("Missing"), "")
            .is_empty());
    }

    #[test]
    fn filtering_is_sound_and_complete() {
        let store = store(&[
            ("One", &["apple pie", "Banana", "cherry", "APPLE"]),
            ("Two", &["pineapple", "grape", ""]),
        ]);
        for query in ["", "apple", "AN", "e", "zzz", "one"] {
            let needle = query.to_lowercase();
            for group in store.list_groups() {
                let listed = store.list_messages(&group, query);
                let expected: Vec<(String, String)> = store
                    .groups()
                    .iter()
                    .filter(|(name, _)| group.is_all() || group.name() == name.as_str())
                    .flat_map(|(name, messages)| {
                        messages.iter().map(move |text| (name.clone(), text.clone()))
                    })
                    .filter(|(name, text)| {
                        text.to_lowercase().contains(&needle)
                            || (group.is_all() && name.to_lowercase().contains(&needle))
                    })
                    .collect();
                let got: Vec<(String, String)> = listed
                    .into_iter()
                    .map(|entry| (entry.group, entry.text))
                    .collect();
                assert_eq!(got, expected, "group {} query {:?}", group, query);
            }
        }
    }

    #[test]
    fn add_group_rejects_reserved_duplicate_and_empty_names() {
        let mut store = store(&[("Ventas", &["x"])]);
        assert!(matches!(
            store.add_group(ALL_MESSAGES),
            Err(BuddyError::Validation(_))
        ));
        assert!(matches!(
            store.add_group("Ventas"),
            Err(BuddyError::Validation(_))
        ));
        assert!(matches!(
            store.add_group("  Ventas  "),
            Err(BuddyError::Validation(_))
        ));
        assert!(matches!(store.add_group("   "), Err(BuddyError::Validation(_))));

        assert_eq!(store.add_group("  Soporte ").unwrap(), "Soporte");
        assert_eq!(store.group("Soporte"), Some(&[][..]));
        // case-sensitive uniqueness
        assert!(store.add_group("ventas").is_ok());
    }

    #[test]
    fn rename_moves_the_messages_unchanged() {
        let mut store = store(&[("Ventas", &["a", "b\nc", "a"]), ("General", &["g"])]);
        let before = messages(&store, "Ventas");
        assert_eq!(store.rename_group("Ventas", "Sales").unwrap(), "Sales");
        let names: Vec<String> = store.list_groups().iter().map(|g| g.to_string()).collect();
        assert!(!names.contains(&"Ventas".to_string()));
        assert!(names.contains(&"Sales".to_string()));
        assert_eq!(messages(&store, "Sales"), before);
        assert_eq!(
            store.groups().keys().collect::<Vec<_>>(),
            vec!["General", "Sales"]
        );
    }

    #[test]
    fn rename_edge_cases() {
        let mut store = store(&[("Ventas", &["a"]), ("General", &[])]);
        assert!(matches!(
            store.rename_group("Ventas", "General"),
            Err(BuddyError::Validation(_))
        ));
        assert!(matches!(
            store.rename_group("Ventas", ALL_MESSAGES),
            Err(BuddyError::Validation(_))
        ));
        assert!(matches!(
            store.rename_group("Ventas", " "),
            Err(BuddyError::Validation(_))
        ));
        assert!(matches!(
            store.rename_group("Nope", "Other"),
            Err(BuddyError::GroupNotFound(_))
        ));
        assert_eq!(
            store.apply(Mutation::RenameGroup {
                from: "Ventas".into(),
                to: " Ventas ".into()
            })
            .unwrap(),
            Applied::Unchanged
        );
        assert_eq!(
            store.groups().keys().collect::<Vec<_>>(),
            vec!["Ventas", "General"]
        );
    }

    #[test]
    fn delete_group_is_idempotent() {
        let mut store = store(&[("Ventas", &["a"])]);
        assert!(store.delete_group("Ventas").unwrap());
        assert!(!store.delete_group("Ventas").unwrap());
        assert!(store.groups().is_empty());
    }

    #[test]
    fn add_message_targets_real_groups_only() {
        let mut store = store(&[("Ventas", &["hi"])]);
        assert!(matches!(
            store.add_message(ALL_MESSAGES, "x"),
            Err(BuddyError::GroupNotFound(_))
        ));
        assert!(matches!(
            store.add_message("Missing", "x"),
            Err(BuddyError::GroupNotFound(_))
        ));
        assert!(store.contains_message("Ventas", "hi"));
        assert_eq!(store.add_message("Ventas", "hi").unwrap(), 1);
        assert_eq!(store.add_message("Ventas", "").unwrap(), 2);
        assert_eq!(messages(&store, "Ventas"), vec!["hi", "hi", ""]);
    }

    #[test]
    fn edit_and_delete_by_position() {
        let mut store = store(&[("G", &["a", "b", "c"]), ("H", &["a", "b"])]);
        assert_eq!(store.delete_message("G", 1).unwrap(), "b");
        assert_eq!(messages(&store, "G"), vec!["a", "c"]);

        store.edit_message("H", 0, "z").unwrap();
        assert_eq!(messages(&store, "H"), vec!["z", "b"]);

        assert!(matches!(
            store.edit_message("H", 2, "x"),
            Err(BuddyError::MessageIndex { index: 2, len: 2, .. })
        ));
        assert!(matches!(
            store.delete_message("Missing", 0),
            Err(BuddyError::GroupNotFound(_))
        ));
        assert_eq!(messages(&store, "H"), vec!["z", "b"]);
    }

    #[test]
    fn locate_revalidates_stale_positions() {
        let mut store = store(&[("G", &["a", "b", "c"])]);
        let entry = store.list_messages(&GroupRef::real("G"), "c").remove(0);
        assert_eq!(store.locate(&entry).unwrap(), 2);

        store.delete_message("G", 0).unwrap();
        assert_eq!(store.locate(&entry).unwrap(), 1);

        store
            .apply(Mutation::DeleteMessage(entry.clone()))
            .unwrap();
        assert_eq!(messages(&store, "G"), vec!["b"]);
        assert!(matches!(
            store.apply(Mutation::DeleteMessage(entry)),
            Err(BuddyError::MessageIndex { .. })
        ));
    }

    #[test]
    fn open_writes_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");
        let store = Store::open(&path).unwrap();
        assert_eq!(store.groups(), &default_groups());
        assert!(path.exists());
        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.groups(), store.groups());
    }

    #[test]
    fn every_mutation_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");
        let mut store = Store::open(&path).unwrap();
        store.add_group("Soporte").unwrap();
        store.add_message("Soporte", "línea 1\nlínea 2").unwrap();
        store.rename_group("Ventas", "Sales").unwrap();
        store.delete_group("General").unwrap();

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.groups(), store.groups());
        assert_eq!(
            reopened.groups().keys().collect::<Vec<_>>(),
            vec!["Soporte", "Sales"]
        );
    }

    #[test]
    fn failed_save_keeps_the_in_memory_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");
        let mut store = Store::open(&path).unwrap();
        // a directory where the file should be makes every write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = store.add_group("Soporte").unwrap_err();
        assert!(matches!(err, BuddyError::Io(_)));
        assert!(store.has_group("Soporte"));
    }
}
