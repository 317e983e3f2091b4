//! Workout Store
//!
//! Shared core of the workout log:
//! - domain: Entry model, photo encoding, form drafts and edit sessions
//! - cache: Local mirror of the remote entry list
//! - repository: Document store abstraction and the entry store client (feature `backend`)
//! - config: Store configuration loading (feature `backend`)

pub mod cache;
pub mod domain;

#[cfg(feature = "backend")]
pub mod config;
#[cfg(feature = "backend")]
pub mod repository;

pub use cache::EntryCache;
pub use domain::{
    DomainError, DomainResult, EditSession, Entity, Entry, EntryDraft, EntryField, NewEntry, Photo,
    StoreInfo,
};
