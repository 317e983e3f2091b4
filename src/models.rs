//! Frontend Models
//!
//! Shared with the backend through the `workout-store` crate, built without
//! its storage backends.

pub use workout_store::{EditSession, Entry, EntryCache, EntryDraft, EntryField, NewEntry, Photo, StoreInfo};
