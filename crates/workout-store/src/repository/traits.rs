//! Repository Layer - Core Traits
//!
//! Defines the abstract interface of a document database.
//! Implementations can use SQLite, Firestore, etc.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::DomainResult;

/// Address of one document: `collection/document`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub collection: String,
    pub document: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            document: document.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.document)
    }
}

/// Opaque version token; changes on every write
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub fields: Map<String, Value>,
    pub revision: Revision,
}

impl Document {
    /// Elements of an array field; `None` if the field is absent or not an array
    pub fn array_field(&self, field: &str) -> Option<&Vec<Value>> {
        self.fields.get(field).and_then(Value::as_array)
    }
}

/// Condition a commit must satisfy to be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The document must not exist yet
    Missing,
    /// The document must still be at this revision
    Revision(Revision),
}

impl Precondition {
    /// Precondition that holds only if nothing changed since `document` was read
    pub fn unchanged_since(document: Option<&Document>) -> Self {
        match document {
            Some(doc) => Precondition::Revision(doc.revision.clone()),
            None => Precondition::Missing,
        }
    }
}

/// Document database operations used by the entry store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs and the UI
    fn kind(&self) -> &'static str;

    /// Read one document; `None` if it does not exist
    async fn get(&self, doc: &DocumentRef) -> DomainResult<Option<Document>>;

    /// Remove every element equal to one of `values` from an array field.
    /// Missing documents and fields are left alone.
    async fn array_remove(&self, doc: &DocumentRef, field: &str, values: &[Value]) -> DomainResult<()>;

    /// Write `fields` into the document if `precondition` holds, otherwise
    /// fail with `DomainError::Conflict`. Fields not named are left as stored.
    /// A missing document is created.
    async fn commit(
        &self,
        doc: &DocumentRef,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> DomainResult<Revision>;
}
