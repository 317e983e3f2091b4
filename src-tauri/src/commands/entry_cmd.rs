//! Tauri Commands for workout entries
//!
//! Exposes the entry store operations to the frontend.

use tauri::State;
use workout_store::{DomainError, Entry, NewEntry, StoreInfo};

use crate::AppState;

fn report(op: &str, e: DomainError) -> String {
    tracing::error!("{} failed: {}", op, e);
    e.to_string()
}

/// All saved entries in stored order
#[tauri::command]
pub async fn list_entries(state: State<'_, AppState>) -> Result<Vec<Entry>, String> {
    state.entries.fetch_all().await.map_err(|e| report("list_entries", e))
}

/// Save a new entry; the store assigns its id
#[tauri::command]
pub async fn add_entry(state: State<'_, AppState>, entry: NewEntry) -> Result<Entry, String> {
    state.entries.append(entry).await.map_err(|e| report("add_entry", e))
}

/// Delete an entry by id. Returns the removed entry, or `None` if it was already gone.
#[tauri::command]
pub async fn delete_entry(state: State<'_, AppState>, id: u32) -> Result<Option<Entry>, String> {
    state.entries.remove(id).await.map_err(|e| report("delete_entry", e))
}

/// Replace the stored entry with the same id
#[tauri::command]
pub async fn update_entry(state: State<'_, AppState>, entry: Entry) -> Result<Entry, String> {
    state.entries.replace(&entry).await.map_err(|e| report("update_entry", e))
}

#[tauri::command]
pub fn store_info(state: State<'_, AppState>) -> StoreInfo {
    state.entries.info()
}
