//! Domain Layer
//!
//! Contains the workout entry model and the rules around it.
//! This layer has no storage dependencies, so the WASM front end can use it directly.

mod draft;
mod entity;
mod entry;
mod photo;
mod store_info;

pub use draft::{EditSession, EntryDraft};
pub use entity::{DomainError, DomainResult, Entity};
pub use entry::{Entry, EntryField, NewEntry};
pub use photo::Photo;
pub use store_info::StoreInfo;
