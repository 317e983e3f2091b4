//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::models::{Entry, EntryCache, StoreInfo};

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// Local mirror of the saved entries
    pub cache: EntryCache,
    /// Backend location, shown in the footer
    pub info: Option<StoreInfo>,
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Store Helper Functions
// ========================

/// Replace the mirror with a fresh list from the backend
pub fn store_replace_entries(store: &AppStore, entries: Vec<Entry>) {
    store.cache().write().replace_all(entries);
}

/// Add a saved entry to the mirror
pub fn store_add_entry(store: &AppStore, entry: Entry) {
    store.cache().write().apply_added(entry);
}

/// Update an entry in the mirror by ID
pub fn store_update_entry(store: &AppStore, entry: Entry) {
    store.cache().write().apply_updated(entry);
}

/// Remove an entry from the mirror by ID
pub fn store_remove_entry(store: &AppStore, id: u32) {
    store.cache().write().apply_removed(id);
}

/// Mark the mirror as out of sync with the backend
pub fn store_invalidate(store: &AppStore) {
    store.cache().write().invalidate();
}

/// The backend could not be read: show nothing rather than old data
pub fn store_mark_unavailable(store: &AppStore) {
    let binding = store.cache();
    let mut cache = binding.write();
    cache.replace_all(Vec::new());
    cache.invalidate();
}
