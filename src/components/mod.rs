//! UI Components
//!
//! Reusable Leptos components.

mod delete_confirm_button;
mod entry_form;
mod entry_row;
mod photo_modal;
mod saved_entries;

pub use delete_confirm_button::DeleteConfirmButton;
pub use entry_form::EntryForm;
pub use entry_row::EntryRow;
pub use photo_modal::PhotoModal;
pub use saved_entries::SavedEntries;
