//! Entry Row Component
//!
//! One saved entry, shown read-only or in edit mode.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::components::DeleteConfirmButton;
use crate::context::use_app_context;
use crate::models::{Entry, EntryField};
use crate::notify::{self, INCOMPLETE_ENTRY_MESSAGE};
use crate::store::{store_invalidate, store_remove_entry, store_update_entry, use_app_store};

/// A single saved entry
#[component]
pub fn EntryRow(entry: Entry) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();

    let id = entry.id;
    let is_editing = move || ctx.is_editing(id);

    let save_edit = move |_| {
        let Some(session) = ctx.editing.get_untracked() else {
            return;
        };
        if !session.is_dirty() {
            ctx.cancel_edit();
            return;
        }
        let Ok(updated) = session.commit() else {
            notify::alert(INCOMPLETE_ENTRY_MESSAGE);
            return;
        };
        spawn_local(async move {
            match commands::update_entry(&updated).await {
                Ok(saved) => store_update_entry(&store, saved),
                Err(e) => {
                    notify::command_failed("update the entry", &e);
                    store_invalidate(&store);
                    ctx.reload();
                }
            }
            ctx.cancel_edit();
        });
    };

    let delete = Callback::new(move |_: ()| {
        spawn_local(async move {
            match commands::delete_entry(id).await {
                Ok(_) => {
                    store_remove_entry(&store, id);
                    if ctx.is_editing(id) {
                        ctx.cancel_edit();
                    }
                }
                Err(e) => {
                    notify::command_failed("delete the entry", &e);
                    store_invalidate(&store);
                    ctx.reload();
                }
            }
        });
    });

    let photo = entry.photo.clone().map(|photo| {
        let preview = photo.clone();
        view! {
            <img
                class="photo-thumb"
                src=photo.as_str().to_string()
                alt=format!("Entry {} photo", id)
                on:click=move |_| ctx.show_photo(preview.clone())
            />
        }
    });

    let edit_entry = entry.clone();
    let fields = move || {
        if is_editing() {
            EntryField::ALL.into_iter().map(|field| view! {
                <input
                    type="text"
                    class="entry-input"
                    placeholder=field.label()
                    prop:value=move || ctx.editing.with(|s| {
                        s.as_ref().map(|s| s.get(field).to_string()).unwrap_or_default()
                    })
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        ctx.editing.update(|s| {
                            if let Some(s) = s {
                                s.set(field, value);
                            }
                        });
                    }
                />
            }.into_any()).collect_view()
        } else {
            EntryField::ALL.into_iter().map(|field| {
                let value = entry.field(field).to_string();
                view! { <div class="entry-value">{value}</div> }.into_any()
            }).collect_view()
        }
    };

    view! {
        <div class=move || if is_editing() { "entry-row editing" } else { "entry-row" }>
            <div class="entry-id">
                <span>{id}</span>
                {photo}
            </div>

            {fields}

            <Show
                when=is_editing
                fallback=move || {
                    let edit_entry = edit_entry.clone();
                    view! {
                        <button class="edit-btn" on:click=move |_| ctx.begin_edit(&edit_entry)>
                            "Edit"
                        </button>
                    }
                }
            >
                <button class="save-btn" on:click=save_edit>"Save"</button>
                <button class="cancel-btn" on:click=move |_| ctx.cancel_edit()>"Cancel"</button>
            </Show>

            <DeleteConfirmButton button_class="delete-btn" on_confirm=delete />
        </div>
    }
}
