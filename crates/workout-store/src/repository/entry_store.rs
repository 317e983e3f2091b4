//! Entry Store Client
//!
//! Keeps the workout entries as an array field of a single document.
//! Appends and replacements are read-modify-write commits guarded by the
//! document revision; removals use the store's remove-matching-value primitive
//! with the exact stored record.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::traits::{DocumentRef, DocumentStore, Precondition};
use crate::domain::{DomainError, DomainResult, Entry, NewEntry, StoreInfo};

/// How many times a commit is retried after losing a race with another writer
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

pub struct EntryStore {
    docs: Arc<dyn DocumentStore>,
    target: DocumentRef,
    field: String,
    max_conflict_retries: u32,
}

impl EntryStore {
    pub fn new(docs: Arc<dyn DocumentStore>, target: DocumentRef, field: impl Into<String>) -> Self {
        Self {
            docs,
            target,
            field: field.into(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn target(&self) -> &DocumentRef {
        &self.target
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn backend_kind(&self) -> &'static str {
        self.docs.kind()
    }

    pub fn info(&self) -> StoreInfo {
        StoreInfo {
            backend: self.backend_kind().to_string(),
            document: self.target.to_string(),
            field: self.field.clone(),
        }
    }

    /// All entries in stored order. A missing document or field reads as empty.
    pub async fn fetch_all(&self) -> DomainResult<Vec<Entry>> {
        let doc = self.docs.get(&self.target).await?;
        let Some(doc) = doc else {
            tracing::debug!("Document {} does not exist yet", self.target);
            return Ok(Vec::new());
        };

        let records: &[Value] = match doc.fields.get(&self.field) {
            Some(Value::Array(records)) => records.as_slice(),
            Some(other) => {
                tracing::warn!("Field {}.{} is not an array: {}", self.target, self.field, other);
                &[]
            }
            None => &[],
        };
        Ok(records.iter().filter_map(decode_record).collect())
    }

    /// Store a new entry and return it with its assigned id
    pub async fn append(&self, new_entry: NewEntry) -> DomainResult<Entry> {
        new_entry.validate()?;
        let entry = self
            .read_modify_write(|records| {
                let id = next_id(records)?;
                let entry = new_entry.clone().into_entry(id);
                records.push(encode_record(&entry)?);
                Ok(entry)
            })
            .await?;
        tracing::info!("Appended entry {} ({}) to {}", entry.id, entry.name, self.target);
        Ok(entry)
    }

    /// Remove the entry with `id`. Unknown ids are a no-op and return `None`.
    pub async fn remove(&self, id: u32) -> DomainResult<Option<Entry>> {
        let doc = self.docs.get(&self.target).await?;
        let found = doc
            .as_ref()
            .and_then(|doc| doc.array_field(&self.field))
            .and_then(|records| {
                records.iter().find_map(|record| {
                    decode_record(record)
                        .filter(|entry| entry.id == id)
                        .map(|entry| (record.clone(), entry))
                })
            });

        let Some((record, entry)) = found else {
            tracing::debug!("Entry {} not in {}, nothing to remove", id, self.target);
            return Ok(None);
        };

        self.docs
            .array_remove(&self.target, &self.field, std::slice::from_ref(&record))
            .await?;
        tracing::info!("Removed entry {} from {}", id, self.target);
        Ok(Some(entry))
    }

    /// Replace the stored entry with the same id, keeping its position.
    /// Keys the record carries besides the entry's own are kept.
    pub async fn replace(&self, entry: &Entry) -> DomainResult<Entry> {
        entry.validate()?;
        let updated = self
            .read_modify_write(|records| {
                let record = records
                    .iter_mut()
                    .find(|record| record_id(record) == Some(entry.id))
                    .ok_or_else(|| DomainError::NotFound(format!("entry {}", entry.id)))?;
                merge_record(record, entry)?;
                Ok(entry.clone())
            })
            .await?;
        tracing::info!("Replaced entry {} in {}", updated.id, self.target);
        Ok(updated)
    }

    /// Apply `change` to the stored records and commit with a revision check,
    /// starting over when another writer got there first.
    async fn read_modify_write<T, F>(&self, mut change: F) -> DomainResult<T>
    where
        F: FnMut(&mut Vec<Value>) -> DomainResult<T> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            let doc = self.docs.get(&self.target).await?;
            let precondition = Precondition::unchanged_since(doc.as_ref());
            let mut stored = doc.map(|doc| doc.fields).unwrap_or_default();
            let mut records = take_records(&mut stored, &self.target, &self.field)?;

            let outcome = change(&mut records)?;
            // Only the entry field is written back
            let mut fields = Map::new();
            fields.insert(self.field.clone(), Value::Array(records));

            match self.docs.commit(&self.target, fields, precondition).await {
                Ok(revision) => {
                    tracing::debug!("Committed {} at revision {}", self.target, revision);
                    return Ok(outcome);
                }
                Err(e) if e.is_conflict() && attempt < self.max_conflict_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Concurrent write to {} ({}), retry {}/{}",
                        self.target,
                        e,
                        attempt,
                        self.max_conflict_retries
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Take the entry array out of the document fields. Anything other than an
/// array is refused rather than overwritten.
fn take_records(fields: &mut Map<String, Value>, target: &DocumentRef, field: &str) -> DomainResult<Vec<Value>> {
    match fields.remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(records)) => Ok(records),
        Some(other) => Err(DomainError::Decode(format!(
            "field {}.{} is not an array: {}",
            target, field, other
        ))),
    }
}

fn record_id(record: &Value) -> Option<u32> {
    record
        .get("id")
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
}

fn next_id(records: &[Value]) -> DomainResult<u32> {
    match records.iter().filter_map(record_id).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| DomainError::InvalidInput("entry ids exhausted".to_string())),
    }
}

fn decode_record(record: &Value) -> Option<Entry> {
    match serde_json::from_value(record.clone()) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!("Skipping unreadable entry record {}: {}", record, e);
            None
        }
    }
}

/// Overwrite the entry's own keys in `record`, keeping any others.
/// An absent photo removes the stored one.
fn merge_record(record: &mut Value, entry: &Entry) -> DomainResult<()> {
    let Value::Object(encoded) = encode_record(entry)? else {
        return Err(DomainError::Decode(format!("entry {} did not encode as an object", entry.id)));
    };
    match record {
        Value::Object(existing) => {
            existing.remove("photo");
            existing.extend(encoded);
        }
        other => *other = Value::Object(encoded),
    }
    Ok(())
}

fn encode_record(entry: &Entry) -> DomainResult<Value> {
    serde_json::to_value(entry).map_err(|e| DomainError::Decode(e.to_string()))
}
