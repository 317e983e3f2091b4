//! Repository Layer
//!
//! Data access abstractions and implementations.

mod db;
mod entry_store;
mod firestore;
mod traits;

#[cfg(test)]
mod tests;

pub use db::SqliteDocumentStore;
pub use entry_store::{EntryStore, DEFAULT_MAX_CONFLICT_RETRIES};
pub use firestore::FirestoreDocumentStore;
pub use traits::{Document, DocumentRef, DocumentStore, Precondition, Revision};
