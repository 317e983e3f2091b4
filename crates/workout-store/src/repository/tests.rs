//! Repository Integration Tests
//!
//! Tests for EntryStore over an in-memory SQLite document store.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::cache::EntryCache;
use crate::domain::{DomainError, DomainResult, Entry, NewEntry, Photo};
use crate::repository::{
    Document, DocumentRef, DocumentStore, EntryStore, Precondition, Revision, SqliteDocumentStore,
};

/// Wraps the SQLite store to record removals, inject concurrent writers and fail reads
struct ScriptedStore {
    inner: SqliteDocumentStore,
    removed: Mutex<Vec<Value>>,
    rival_writes: AtomicU32,
    offline: AtomicBool,
}

impl ScriptedStore {
    fn new() -> Self {
        Self {
            inner: SqliteDocumentStore::open_in_memory().expect("Failed to open test DB"),
            removed: Mutex::new(Vec::new()),
            rival_writes: AtomicU32::new(0),
            offline: AtomicBool::new(false),
        }
    }

    fn removed(&self) -> Vec<Value> {
        self.removed.lock().unwrap().clone()
    }

    /// Another client appends a record between our read and our commit
    async fn rival_write(&self, doc: &DocumentRef) -> DomainResult<()> {
        let current = self.inner.get(doc).await?;
        let precondition = Precondition::unchanged_since(current.as_ref());
        let mut fields = current.map(|d| d.fields).unwrap_or_default();
        let mut entries = fields
            .remove("entries")
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default();
        let id = 100 + entries.len() as u32;
        entries.push(json!({"id": id, "name": "Rival", "weight": "1", "reps": "1"}));
        fields.insert("entries".to_string(), Value::Array(entries));
        self.inner.commit(doc, fields, precondition).await.map(|_| ())
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    fn kind(&self) -> &'static str {
        "scripted"
    }

    async fn get(&self, doc: &DocumentRef) -> DomainResult<Option<Document>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DomainError::Transport("network unreachable".to_string()));
        }
        self.inner.get(doc).await
    }

    async fn array_remove(&self, doc: &DocumentRef, field: &str, values: &[Value]) -> DomainResult<()> {
        self.removed.lock().unwrap().extend(values.iter().cloned());
        self.inner.array_remove(doc, field, values).await
    }

    async fn commit(
        &self,
        doc: &DocumentRef,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> DomainResult<Revision> {
        let pending = self.rival_writes.load(Ordering::SeqCst);
        if pending > 0 {
            self.rival_writes.store(pending - 1, Ordering::SeqCst);
            self.rival_write(doc).await?;
        }
        self.inner.commit(doc, fields, precondition).await
    }
}

fn target() -> DocumentRef {
    DocumentRef::new("workouts", "log")
}

fn setup() -> (Arc<ScriptedStore>, EntryStore) {
    let docs = Arc::new(ScriptedStore::new());
    let store = EntryStore::new(docs.clone(), target(), "entries");
    (docs, store)
}

async fn seed(docs: &ScriptedStore, entries: Value) {
    let fields = json!({ "entries": entries }).as_object().cloned().unwrap();
    docs.inner
        .commit(&target(), fields, Precondition::Missing)
        .await
        .expect("Failed to seed");
}

fn squat() -> NewEntry {
    NewEntry::new("Squat", "100", "5")
}

#[tokio::test]
async fn test_fetch_all_on_absent_document_is_empty() {
    let (_, store) = setup();
    assert_eq!(store.fetch_all().await.unwrap(), Vec::<Entry>::new());
}

#[tokio::test]
async fn test_fetch_all_on_document_without_field_is_empty() {
    let (docs, store) = setup();
    docs.inner
        .commit(&target(), Map::new(), Precondition::Missing)
        .await
        .unwrap();
    assert!(store.fetch_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_squat_scenario() {
    let (_, store) = setup();
    let mut cache = EntryCache::new();
    cache.replace_all(store.fetch_all().await.unwrap());

    let saved = store.append(squat()).await.unwrap();
    cache.apply_added(saved);

    let expected = vec![Entry::new(1, "Squat".into(), "100".into(), "5".into())];
    assert_eq!(cache.entries(), expected.as_slice());
    assert_eq!(store.fetch_all().await.unwrap(), expected);
}

#[tokio::test]
async fn test_ids_follow_the_largest_stored_id() {
    let (docs, store) = setup();
    seed(&docs, json!([
        {"id": 1, "name": "Squat", "weight": "100", "reps": "5"},
        {"id": 4, "name": "Bench", "weight": "80", "reps": "8"}
    ]))
    .await;

    let saved = store.append(NewEntry::new("Row", "60", "10")).await.unwrap();
    assert_eq!(saved.id, 5);
}

#[tokio::test]
async fn test_photo_is_persisted() {
    let (_, store) = setup();
    let photo = Photo::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
    let mut new_entry = squat();
    new_entry.photo = Some(photo.clone());

    store.append(new_entry).await.unwrap();
    let entries = store.fetch_all().await.unwrap();
    assert_eq!(entries[0].photo, Some(photo));
}

#[tokio::test]
async fn test_delete_squat_scenario() {
    let (docs, store) = setup();
    let saved = store.append(squat()).await.unwrap();
    let mut cache = EntryCache::new();
    cache.replace_all(store.fetch_all().await.unwrap());

    let removed = store.remove(saved.id).await.unwrap();
    assert_eq!(removed.as_ref(), Some(&saved));
    cache.apply_removed(saved.id);

    assert!(cache.is_empty());
    assert!(store.fetch_all().await.unwrap().is_empty());
    assert_eq!(
        docs.removed(),
        vec![json!({"id": 1, "name": "Squat", "weight": "100", "reps": "5"})]
    );
}

#[tokio::test]
async fn test_remove_sends_the_stored_record_verbatim() {
    let (docs, store) = setup();
    // Written by an older client: empty photo string
    let legacy = json!({"id": 1, "name": "Squat", "weight": "100", "reps": "5", "photo": ""});
    seed(&docs, json!([legacy.clone()])).await;

    store.remove(1).await.unwrap();
    assert_eq!(docs.removed(), vec![legacy]);
    assert!(store.fetch_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_unsaved_entry_is_noop() {
    let (docs, store) = setup();
    store.append(squat()).await.unwrap();
    let before = docs.inner.get(&target()).await.unwrap().unwrap().revision;

    assert_eq!(store.remove(42).await.unwrap(), None);

    assert!(docs.removed().is_empty());
    let after = docs.inner.get(&target()).await.unwrap().unwrap().revision;
    assert_eq!(before, after);
    assert_eq!(store.fetch_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_on_absent_document_is_noop() {
    let (docs, store) = setup();
    assert_eq!(store.remove(1).await.unwrap(), None);
    assert!(docs.inner.get(&target()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_replace_touches_only_matching_id() {
    let (_, store) = setup();
    let first = store.append(squat()).await.unwrap();
    let second = store.append(squat()).await.unwrap();

    let mut edited = second.clone();
    edited.weight = "105".to_string();
    store.replace(&edited).await.unwrap();

    let entries = store.fetch_all().await.unwrap();
    assert_eq!(entries, vec![first, edited]);
}

#[tokio::test]
async fn test_replace_keeps_position() {
    let (_, store) = setup();
    let squat = store.append(squat()).await.unwrap();
    store.append(NewEntry::new("Bench", "80", "8")).await.unwrap();

    let mut edited = squat.clone();
    edited.name = "Front Squat".to_string();
    store.replace(&edited).await.unwrap();

    let names: Vec<_> = store.fetch_all().await.unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, ["Front Squat", "Bench"]);
}

#[tokio::test]
async fn test_replace_missing_entry_is_not_found() {
    let (_, store) = setup();
    store.append(squat()).await.unwrap();
    let ghost = Entry::new(9, "Ghost".into(), "0".into(), "0".into());
    assert!(matches!(store.replace(&ghost).await, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_legacy_duplicate_ids_replace_first_match_only() {
    let (docs, store) = setup();
    seed(&docs, json!([
        {"id": 1, "name": "Squat", "weight": "100", "reps": "5"},
        {"id": 1, "name": "Deadlift", "weight": "140", "reps": "3"}
    ]))
    .await;

    let edited = Entry::new(1, "Squat".into(), "110".into(), "5".into());
    store.replace(&edited).await.unwrap();

    let entries = store.fetch_all().await.unwrap();
    assert_eq!(entries[0].weight, "110");
    assert_eq!(entries[1].name, "Deadlift");
}

#[tokio::test]
async fn test_legacy_identical_records_are_removed_together() {
    // Records written before ids were assigned by the store can be exact copies.
    // The remote remove-matching-value primitive drops every copy.
    let (docs, store) = setup();
    let copy = json!({"id": 1, "name": "Squat", "weight": "100", "reps": "5"});
    seed(&docs, json!([copy.clone(), copy])).await;

    store.remove(1).await.unwrap();
    assert!(store.fetch_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreadable_records_survive_writes() {
    let (docs, store) = setup();
    let odd = json!({"note": "not an entry"});
    seed(&docs, json!([odd.clone(), {"id": 2, "name": "Bench", "weight": "80", "reps": "8"}])).await;

    assert_eq!(store.fetch_all().await.unwrap().len(), 1);

    let saved = store.append(squat()).await.unwrap();
    assert_eq!(saved.id, 3);
    let mut edited = saved.clone();
    edited.reps = "6".to_string();
    store.replace(&edited).await.unwrap();
    store.remove(2).await.unwrap();

    let doc = docs.inner.get(&target()).await.unwrap().unwrap();
    let records = doc.array_field("entries").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], odd);
}

#[tokio::test]
async fn test_non_array_field_is_not_overwritten() {
    let (docs, store) = setup();
    let fields = json!({"entries": "oops"}).as_object().cloned().unwrap();
    docs.inner.commit(&target(), fields, Precondition::Missing).await.unwrap();

    assert!(store.fetch_all().await.unwrap().is_empty());
    assert!(matches!(store.append(squat()).await, Err(DomainError::Decode(_))));
}

#[tokio::test]
async fn test_concurrent_writer_causes_retry() {
    let (docs, store) = setup();
    store.append(squat()).await.unwrap();

    docs.rival_writes.store(1, Ordering::SeqCst);
    let saved = store.append(NewEntry::new("Bench", "80", "8")).await.unwrap();

    let entries = store.fetch_all().await.unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Squat", "Rival", "Bench"]);
    assert_eq!(saved.id, 102);
}

#[tokio::test]
async fn test_conflict_after_retries_exhausted() {
    let docs = Arc::new(ScriptedStore::new());
    let store = EntryStore::new(docs.clone(), target(), "entries").with_max_conflict_retries(1);

    docs.rival_writes.store(5, Ordering::SeqCst);
    let result = store.append(squat()).await;
    assert!(matches!(result, Err(DomainError::Conflict(_))));
}

#[tokio::test]
async fn test_transport_failure_is_reported() {
    let (docs, store) = setup();
    docs.offline.store(true, Ordering::SeqCst);
    assert!(matches!(store.fetch_all().await, Err(DomainError::Transport(_))));
    assert!(matches!(store.append(squat()).await, Err(DomainError::Transport(_))));
}

#[tokio::test]
async fn test_store_metadata() {
    let (_, store) = setup();
    assert_eq!(store.backend_kind(), "scripted");
    assert_eq!(store.target().to_string(), "workouts/log");
    assert_eq!(store.field(), "entries");
    assert_eq!(store.info().location(), "scripted workouts/log#entries");
}

#[tokio::test]
async fn test_replace_keeps_keys_it_does_not_own() {
    let (docs, store) = setup();
    seed(&docs, json!([{
        "id": 1, "name": "Squat", "weight": "100", "reps": "5",
        "photo": "data:image/png;base64,iVBORw0KGgo=",
        "rpe": 8
    }]))
    .await;

    let edited = Entry::new(1, "Squat".into(), "105".into(), "5".into());
    store.replace(&edited).await.unwrap();

    let doc = docs.inner.get(&target()).await.unwrap().unwrap();
    assert_eq!(
        doc.array_field("entries").unwrap()[0],
        json!({"id": 1, "name": "Squat", "weight": "105", "reps": "5", "rpe": 8})
    );
}

#[tokio::test]
async fn test_writes_leave_other_document_fields_alone() {
    let (docs, store) = setup();
    let fields = json!({"entries": [], "createdAt": "2024-10-01T12:00:00Z"})
        .as_object()
        .cloned()
        .unwrap();
    docs.inner.commit(&target(), fields, Precondition::Missing).await.unwrap();

    let saved = store.append(squat()).await.unwrap();
    let mut edited = saved.clone();
    edited.reps = "6".to_string();
    store.replace(&edited).await.unwrap();

    let doc = docs.inner.get(&target()).await.unwrap().unwrap();
    assert_eq!(doc.fields["createdAt"], json!("2024-10-01T12:00:00Z"));
    assert_eq!(store.fetch_all().await.unwrap(), vec![edited]);
}

#[tokio::test]
async fn test_blank_fields_are_rejected_before_writing() {
    let (docs, store) = setup();
    assert!(matches!(
        store.append(NewEntry::new("", "100", "5")).await,
        Err(DomainError::InvalidInput(_))
    ));
    assert!(docs.inner.get(&target()).await.unwrap().is_none());

    let saved = store.append(squat()).await.unwrap();
    let mut blank = saved.clone();
    blank.reps = String::new();
    assert!(matches!(store.replace(&blank).await, Err(DomainError::InvalidInput(_))));
    assert_eq!(store.fetch_all().await.unwrap(), vec![saved]);
}
