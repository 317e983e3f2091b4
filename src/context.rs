//! Application Context
//!
//! Shared state provided via Leptos Context API.

use leptos::prelude::*;

use crate::models::{EditSession, Entry, Photo};

/// App-wide signals provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Trigger to reload entries from backend - read
    pub reload_trigger: ReadSignal<u32>,
    /// Trigger to reload entries from backend - write
    set_reload_trigger: WriteSignal<u32>,
    /// Photo shown in the preview modal
    pub preview: RwSignal<Option<Photo>>,
    /// The one entry being edited, with its staged values
    pub editing: RwSignal<Option<EditSession>>,
}

impl AppContext {
    pub fn new(reload_trigger: (ReadSignal<u32>, WriteSignal<u32>)) -> Self {
        Self {
            reload_trigger: reload_trigger.0,
            set_reload_trigger: reload_trigger.1,
            preview: RwSignal::new(None),
            editing: RwSignal::new(None),
        }
    }

    /// Trigger a reload of entries
    pub fn reload(&self) {
        self.set_reload_trigger.update(|v| *v += 1);
    }

    pub fn show_photo(&self, photo: Photo) {
        self.preview.set(Some(photo));
    }

    pub fn close_photo(&self) {
        self.preview.set(None);
    }

    /// Start editing `entry`, dropping any other unsaved edit
    pub fn begin_edit(&self, entry: &Entry) {
        self.editing.set(Some(EditSession::begin(entry)));
    }

    pub fn cancel_edit(&self) {
        self.editing.set(None);
    }

    pub fn is_editing(&self, id: u32) -> bool {
        self.editing.with(|session| session.as_ref().is_some_and(|s| s.id() == id))
    }
}

pub fn use_app_context() -> AppContext {
    expect_context::<AppContext>()
}
