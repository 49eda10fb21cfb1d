use cloudnote_core::{
    fields, ClientConfig, ErrorKind, FieldValue, ManualClock, MemoryAccount, MemoryDatastore,
    MemoryObjectStore, NotesClient, RecordKind, RepoError, DEFAULT_FOLDER_NAME,
};
use std::sync::Arc;

fn setup() -> (NotesClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000));
    let client = NotesClient::with_clock(
        ClientConfig::default(),
        Arc::new(MemoryObjectStore::new("https://files.test")),
        clock.clone(),
    );
    let datastore = Arc::new(MemoryDatastore::default());
    client.connect(&MemoryAccount::new(datastore)).unwrap();
    (client, clock)
}

#[test]
fn create_without_arguments_seeds_defaults() {
    let (client, _) = setup();

    let folder = client.folders.create(None, None).unwrap();
    assert_eq!(folder.name, DEFAULT_FOLDER_NAME);
    assert_eq!(folder.created, 1_000);
    assert_eq!(folder.modified, 1_000);
    assert!(folder.notes.is_empty());
    assert!(!folder.id.is_empty());
}

#[test]
fn create_name_argument_wins_over_extra_fields() {
    let (client, _) = setup();

    let extra = fields([("name", "From fields"), ("color", "red")]);
    let folder = client.folders.create(Some("Work"), Some(extra)).unwrap();
    assert_eq!(folder.name, "Work");
    assert!(folder.notes.is_empty());

    let stored = client.folders.query(&fields([("color", "red")])).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, folder.id);

    let from_fields = client
        .folders
        .create(None, Some(fields([("name", "From fields")])))
        .unwrap();
    assert_eq!(from_fields.name, "From fields");
    assert_eq!(from_fields.created, 1_000);
}

#[test]
fn query_filters_and_empty_filter_lists_all() {
    let (client, _) = setup();
    client.folders.create(Some("A"), None).unwrap();
    client.folders.create(Some("B"), None).unwrap();

    assert_eq!(client.folders.query(&Default::default()).unwrap().len(), 2);
    let only_b = client.folders.query(&fields([("name", "B")])).unwrap();
    assert_eq!(only_b.len(), 1);
    assert_eq!(only_b[0].name, "B");
    assert_eq!(
        client.folders.deferred_query(&fields([("name", "A")])).unwrap().len(),
        1
    );
}

#[test]
fn rename_updates_name_and_modified_only() {
    let (client, clock) = setup();
    let folder = client.folders.create(Some("Old"), None).unwrap();
    let note = client.notes.create("n", &folder.id, None).unwrap();

    clock.advance(500);
    let renamed = client.folders.rename(&folder, "New").unwrap();

    assert_eq!(renamed.name, "New");
    assert_eq!(renamed.modified, 1_500);
    assert_eq!(renamed.created, folder.created);
    assert_eq!(renamed.notes, vec![note.id]);
}

#[test]
fn update_merges_props_and_accepts_plain_id() {
    let (client, clock) = setup();
    let folder = client.folders.create(Some("Box"), None).unwrap();

    clock.advance(10);
    let updated = client
        .folders
        .update(folder.id.as_str(), fields([("name", "Crate")]))
        .unwrap();
    assert_eq!(updated.name, "Crate");
    assert_eq!(updated.modified, 1_010);

    let fetched = client.folders.get(&folder.id).unwrap().unwrap();
    assert_eq!(fetched, updated);
}

#[test]
fn delete_without_notes_releases_contained_notes() {
    let (client, _) = setup();
    let folder = client.folders.create(Some("Inbox"), None).unwrap();
    let first = client.notes.create("first", &folder.id, None).unwrap();
    let second = client.notes.create("second", &folder.id, None).unwrap();

    let deleted = client.folders.delete(&folder, false).unwrap();
    assert_eq!(deleted.id, folder.id);
    assert_eq!(deleted.notes, vec![first.id.clone(), second.id.clone()]);
    assert!(client.folders.get(&folder.id).unwrap().is_none());

    for id in [&first.id, &second.id] {
        let note = client.notes.get(id).unwrap().unwrap();
        assert_eq!(note.folder, "");
        assert!(note.folder_id().is_none());
    }
}

#[test]
fn delete_with_notes_removes_contained_notes() {
    let (client, _) = setup();
    let doomed = client.folders.create(Some("Doomed"), None).unwrap();
    let kept = client.folders.create(Some("Kept"), None).unwrap();
    let gone = client.notes.create("gone", &doomed.id, None).unwrap();
    let stays = client.notes.create("stays", &kept.id, None).unwrap();

    client.folders.delete(doomed.id.as_str(), true).unwrap();

    assert!(client.notes.get(&gone.id).unwrap().is_none());
    assert!(client.notes.get(&stays.id).unwrap().is_some());
    assert_eq!(client.notes.query(&Default::default()).unwrap().len(), 1);
}

#[test]
fn delete_missing_folder_is_not_found() {
    let (client, _) = setup();

    let err = client.folders.delete("missing", false).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { kind: RecordKind::Folder, ref id } if id == "missing"
    ));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn add_and_remove_note_only_touch_folder_side() {
    let (client, _) = setup();
    let home = client.folders.create(Some("Home"), None).unwrap();
    let other = client.folders.create(Some("Other"), None).unwrap();
    let note = client.notes.create("n", &home.id, None).unwrap();

    let other_after_add = client.folders.add_note(&other, &note.id).unwrap();
    assert!(other_after_add.contains_note(&note.id));
    assert_eq!(client.notes.get(&note.id).unwrap().unwrap().folder, home.id);

    let home_after_remove = client.folders.remove_note(&home, &note.id).unwrap();
    assert!(!home_after_remove.contains_note(&note.id));
    assert_eq!(client.notes.get(&note.id).unwrap().unwrap().folder, home.id);
}

#[test]
fn remove_note_ignores_ids_not_listed() {
    let (client, _) = setup();
    let folder = client.folders.create(Some("F"), None).unwrap();
    let note = client.notes.create("n", &folder.id, None).unwrap();

    let unchanged = client.folders.remove_note(&folder, "not-listed").unwrap();
    assert_eq!(unchanged.notes, vec![note.id]);
}

#[test]
fn get_missing_folder_returns_none() {
    let (client, _) = setup();
    assert!(client.folders.get("nope").unwrap().is_none());
}

#[test]
fn stored_dates_are_date_values() {
    let datastore = Arc::new(MemoryDatastore::default());
    let client = NotesClient::with_clock(
        ClientConfig::default(),
        Arc::new(MemoryObjectStore::new("https://files.test")),
        Arc::new(ManualClock::new(42)),
    );
    client.connect(&MemoryAccount::new(datastore.clone())).unwrap();
    let folder = client.folders.create(Some("F"), None).unwrap();

    let table = datastore.memory_table("folders");
    let record = cloudnote_core::Table::get(table.as_ref(), &folder.id)
        .unwrap()
        .unwrap();
    assert_eq!(record.get("created"), Some(&FieldValue::Date(42)));
    assert_eq!(record.get("notes"), Some(&FieldValue::List(vec![])));
}

#[test]
fn update_with_wrongly_typed_props_writes_nothing() {
    let (client, clock) = setup();
    let folder = client.folders.create(Some("Box"), None).unwrap();

    clock.advance(5);
    let err = client
        .folders
        .update(&folder, fields([("name", true)]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = client
        .folders
        .update(&folder, fields([("notes", "n1,n2")]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = client
        .folders
        .update(&folder, fields([("created", "yesterday")]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    assert_eq!(client.folders.get(&folder.id).unwrap().unwrap(), folder);
    assert_eq!(client.folders.query(&Default::default()).unwrap(), vec![folder]);
}

#[test]
fn create_with_wrongly_typed_extra_fields_inserts_nothing() {
    let (client, _) = setup();

    let err = client
        .folders
        .create(None, Some(fields([("notes", 3.0)])))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidArgument(ref message) if message.contains("notes")));

    let err = client
        .folders
        .create(None, Some(fields([("name", false)])))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    assert!(client.folders.query(&Default::default()).unwrap().is_empty());
}
