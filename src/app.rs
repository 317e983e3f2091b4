//! Workout Log Frontend App
//!
//! Single-column layout: new entry form, saved entries, footer.

use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;

use crate::commands;
use crate::components::{EntryForm, PhotoModal, SavedEntries};
use crate::context::AppContext;
use crate::notify;
use crate::store::{store_mark_unavailable, store_replace_entries, AppState, AppStateStoreFields};

#[component]
pub fn App() -> impl IntoView {
    let store = Store::new(AppState::default());
    provide_context(store);

    let (reload_trigger, set_reload_trigger) = signal(0u32);
    let ctx = AppContext::new((reload_trigger, set_reload_trigger));
    provide_context(ctx);

    // Load entries on mount and whenever the mirror has to be refetched
    Effect::new(move |_| {
        let trigger = reload_trigger.get();
        web_sys::console::log_1(&format!("[APP] Loading entries, trigger={}", trigger).into());
        spawn_local(async move {
            match commands::list_entries().await {
                Ok(loaded) => {
                    web_sys::console::log_1(&format!("[APP] Loaded {} entries", loaded.len()).into());
                    store_replace_entries(&store, loaded);
                }
                Err(e) => {
                    notify::command_failed("load entries", &e);
                    store_mark_unavailable(&store);
                }
            }
        });
    });

    Effect::new(move |_| {
        spawn_local(async move {
            match commands::store_info().await {
                Ok(info) => store.info().set(Some(info)),
                Err(e) => web_sys::console::warn_1(&format!("[APP] No store info: {}", e).into()),
            }
        });
    });

    view! {
        <main class="app-layout">
            <h1>"Progress Cal"</h1>

            <EntryForm />

            <Show when=move || store.cache().read().is_stale()>
                <p class="stale-hint">"Entries may be out of date."</p>
            </Show>

            <SavedEntries />

            <footer class="app-footer">
                <span class="entry-count">
                    {move || format!("{} entries", store.cache().read().len())}
                </span>
                {move || store.info().get().map(|info| view! {
                    <span class="store-location">{info.location()}</span>
                })}
            </footer>

            <PhotoModal />
        </main>
    }
}
