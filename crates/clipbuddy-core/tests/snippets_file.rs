use clipbuddy_core::codec::{deserialize, serialize};
use clipbuddy_core::{
    BuddyError, Config, GroupRef, ImportMode, Mutation, RefreshView, Result, SnippetHub, Store,
    ViewKind, ALL_MESSAGES,
};
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

fn open_fresh() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_data_dir(dir.path());
    let store = Store::open(config.db_path()).unwrap();
    (dir, store)
}

#[test]
fn persisted_file_never_contains_the_virtual_group() {
    let (dir, mut store) = open_fresh();
    store.add_group("Soporte").unwrap();
    let content = fs::read_to_string(dir.path().join("snippets.json")).unwrap();
    assert!(!content.contains(ALL_MESSAGES));

    let document = serialize(store.groups());
    assert_eq!(serialize(&deserialize(document.clone())), document);
}

#[test]
fn hand_edited_file_is_repaired_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snippets.json");
    fs::write(
        &path,
        r#"{ "Ventas": ["hi", 5, null], "Roto": {"x": 1}, "Todos Los mensajes": ["v"] }"#,
    )
    .unwrap();
    let store = Store::open(&path).unwrap();
    assert_eq!(store.group("Ventas").unwrap(), ["hi", "5"]);
    assert_eq!(store.group("Roto").unwrap().len(), 0);
    assert!(!store.has_group(ALL_MESSAGES));
    assert_eq!(store.list_groups()[0], GroupRef::All);
}

#[test]
fn merge_import_keeps_existing_data_and_skips_duplicates() {
    let (dir, mut store) = open_fresh();
    store.add_message("Ventas", "hi").unwrap();
    let before = store.group("Ventas").unwrap().to_vec();

    let csv_path = dir.path().join("in.csv");
    fs::write(&csv_path, "group,message\nVentas,hi\nVentas,hi\nNuevo,uno\n").unwrap();

    let import = store.read_import(&csv_path, ImportMode::Merge).unwrap();
    let groups = import.into_result().unwrap();
    store.apply(Mutation::ReplaceAll(groups)).unwrap();

    assert_eq!(store.group("Ventas").unwrap(), before.as_slice());
    assert_eq!(store.group("Nuevo").unwrap(), ["uno"]);
    assert!(store.has_group("General"));
}

#[test]
fn replace_import_discards_groups_not_in_the_file() {
    let (dir, mut store) = open_fresh();
    let csv_path = dir.path().join("in.csv");
    fs::write(&csv_path, "group,message\nVentas,hi\nVentas,hi\n").unwrap();

    let import = store.read_import(&csv_path, ImportMode::Replace).unwrap();
    store
        .apply(Mutation::ReplaceAll(import.into_result().unwrap()))
        .unwrap();

    assert_eq!(store.sorted_group_names(), vec!["Ventas"]);
    assert_eq!(store.group("Ventas").unwrap(), ["hi"]);

    let reopened = Store::open(dir.path().join("snippets.json")).unwrap();
    assert_eq!(reopened.groups(), store.groups());
}

#[test]
fn header_error_leaves_the_store_untouched() {
    let (dir, store) = open_fresh();
    let csv_path = dir.path().join("bad.csv");
    fs::write(&csv_path, "name,text\nVentas,hi\n").unwrap();
    let err = store
        .read_import(&csv_path, ImportMode::Replace)
        .unwrap_err();
    assert!(matches!(err, BuddyError::Format(_)));
    assert!(store.has_group("General"));
}

#[test]
fn export_then_replace_import_round_trips_through_disk() {
    let (dir, mut store) = open_fresh();
    store
        .add_message("General", "línea 1\nlínea 2, con coma")
        .unwrap();
    let csv_path = dir.path().join("out.csv");
    store.export_csv(&csv_path).unwrap();

    let snapshot = store.groups().clone();
    store.apply(Mutation::DeleteGroup("General".into())).unwrap();
    let import = store.read_import(&csv_path, ImportMode::Replace).unwrap();
    store
        .apply(Mutation::ReplaceAll(import.into_result().unwrap()))
        .unwrap();
    assert_eq!(store.groups(), &snapshot);
}

#[test]
fn hub_commit_writes_the_file() {
    let (dir, store) = open_fresh();
    let mut hub = SnippetHub::new(store);
    hub.commit(Mutation::RenameGroup {
        from: "Ventas".into(),
        to: "Sales".into(),
    })
    .unwrap();

    let reopened = Store::open(dir.path().join("snippets.json")).unwrap();
    assert!(reopened.has_group("Sales"));
    assert!(!reopened.has_group("Ventas"));
}

#[derive(Default)]
struct GroupListView {
    refreshes: usize,
    names: Vec<String>,
}

impl RefreshView for GroupListView {
    fn kind(&self) -> ViewKind {
        ViewKind::Manager
    }

    fn refresh(&mut self, store: &Store) -> Result<()> {
        self.refreshes += 1;
        self.names = store
            .sorted_group_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        Ok(())
    }
}

#[test]
fn views_refresh_even_when_the_save_fails() {
    let (dir, store) = open_fresh();
    let mut hub = SnippetHub::new(store);
    let view = Rc::new(RefCell::new(GroupListView::default()));
    hub.open_view(&view).unwrap();
    assert_eq!(view.borrow().refreshes, 1);

    // a directory where the snippets file should be makes every save fail
    let db_path = dir.path().join("snippets.json");
    fs::remove_file(&db_path).unwrap();
    fs::create_dir(&db_path).unwrap();

    let err = hub.commit(Mutation::AddGroup("Soporte".into())).unwrap_err();
    assert!(matches!(err, BuddyError::Io(_)));
    assert!(hub.store().has_group("Soporte"));
    assert_eq!(view.borrow().refreshes, 2);
    assert!(view.borrow().names.contains(&"Soporte".to_string()));
}
