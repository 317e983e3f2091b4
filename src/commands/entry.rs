//! Entry Commands
//!
//! Frontend bindings for the workout entry commands.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::call;
use crate::models::{Entry, NewEntry, StoreInfo};

// ========================
// Argument Structs
// ========================

#[derive(Serialize)]
struct EntryArgs<'a, T> {
    entry: &'a T,
}

#[derive(Serialize)]
struct IdArgs {
    id: u32,
}

fn to_args<T: Serialize>(args: &T) -> Result<JsValue, String> {
    serde_wasm_bindgen::to_value(args).map_err(|e| e.to_string())
}

// ========================
// Entry Commands
// ========================

pub async fn list_entries() -> Result<Vec<Entry>, String> {
    call("list_entries", JsValue::NULL).await
}

pub async fn add_entry(entry: &NewEntry) -> Result<Entry, String> {
    call("add_entry", to_args(&EntryArgs { entry })?).await
}

pub async fn delete_entry(id: u32) -> Result<Option<Entry>, String> {
    call("delete_entry", to_args(&IdArgs { id })?).await
}

pub async fn update_entry(entry: &Entry) -> Result<Entry, String> {
    call("update_entry", to_args(&EntryArgs { entry })?).await
}

pub async fn store_info() -> Result<StoreInfo, String> {
    call("store_info", JsValue::NULL).await
}
