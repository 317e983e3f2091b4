//! Commands Layer
//!
//! Tauri command handlers that bridge frontend to the entry store.

mod entry_cmd;

pub use entry_cmd::*;
