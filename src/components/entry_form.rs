//! Entry Form Component
//!
//! The pending-entry row: photo picker, name/weight/reps inputs and Save.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::context::use_app_context;
use crate::models::{EntryDraft, EntryField};
use crate::notify::{self, INCOMPLETE_ENTRY_MESSAGE};
use crate::photo_reader::read_photo;
use crate::store::{store_add_entry, store_invalidate, use_app_store};

/// Form for recording a new entry
#[component]
pub fn EntryForm() -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();

    let draft = RwSignal::new(EntryDraft::default());
    let (saving, set_saving) = signal(false);

    let save = move |_| {
        let Ok(new_entry) = draft.with(|d| d.validate()) else {
            notify::alert(INCOMPLETE_ENTRY_MESSAGE);
            return;
        };
        set_saving.set(true);
        spawn_local(async move {
            match commands::add_entry(&new_entry).await {
                Ok(saved) => {
                    store_add_entry(&store, saved);
                    draft.update(|d| d.clear());
                }
                Err(e) => {
                    notify::command_failed("save the entry", &e);
                    store_invalidate(&store);
                    ctx.reload();
                }
            }
            set_saving.set(false);
        });
    };

    view! {
        <div class="entry-form">
            <div class="photo-slot">
                {move || match draft.with(|d| d.photo.clone()) {
                    Some(photo) => {
                        let preview = photo.clone();
                        view! {
                            <img
                                class="photo-thumb"
                                src=photo.as_str().to_string()
                                alt="New entry photo"
                                on:click=move |_| ctx.show_photo(preview.clone())
                            />
                            <button
                                type="button"
                                class="photo-clear-btn"
                                on:click=move |_| draft.update(|d| d.photo = None)
                            >
                                "×"
                            </button>
                        }.into_any()
                    }
                    None => view! {
                        <label class="upload-btn">
                            "Upload Image"
                            <input
                                type="file"
                                accept="image/*"
                                class="hidden"
                                on:change=move |ev| {
                                    let input: web_sys::HtmlInputElement = event_target(&ev);
                                    let Some(file) = input.files().and_then(|files| files.get(0)) else {
                                        return;
                                    };
                                    input.set_value("");
                                    read_photo(file, move |photo| draft.update(|d| d.photo = Some(photo)));
                                }
                            />
                        </label>
                    }.into_any(),
                }}
            </div>

            {EntryField::ALL.into_iter().map(|field| view! {
                <input
                    type="text"
                    class="entry-input"
                    placeholder=field.label()
                    prop:value=move || draft.with(|d| d.get(field).to_string())
                    on:input=move |ev| draft.update(|d| d.set(field, event_target_value(&ev)))
                />
            }).collect_view()}

            <button
                type="button"
                class="save-btn"
                disabled=move || saving.get()
                on:click=save
            >
                "Save"
            </button>
        </div>
    }
}
