//! Saved Entries Component
//!
//! Renders the local mirror of saved entries in stored order.

use leptos::prelude::*;

use crate::components::EntryRow;
use crate::store::{use_app_store, AppStateStoreFields};

#[component]
pub fn SavedEntries() -> impl IntoView {
    let store = use_app_store();

    view! {
        <div class="saved-entries">
            {move || {
                let entries = store.cache().read().entries().to_vec();
                if entries.is_empty() {
                    view! { <p class="empty-hint">"No entries yet"</p> }.into_any()
                } else {
                    entries.into_iter()
                        .map(|entry| view! { <EntryRow entry=entry /> })
                        .collect_view()
                        .into_any()
                }
            }}
        </div>
    }
}
