//! Photo Modal Component
//!
//! Full-size preview of an entry photo.

use leptos::prelude::*;

use crate::context::use_app_context;

#[component]
pub fn PhotoModal() -> impl IntoView {
    let ctx = use_app_context();

    move || ctx.preview.get().map(|photo| view! {
        <div class="modal-backdrop" on:click=move |_| ctx.close_photo()>
            <div class="modal" on:click=|ev| ev.stop_propagation()>
                <img class="modal-image" src=photo.as_str().to_string() alt="Preview" />
                <button class="close-btn" on:click=move |_| ctx.close_photo()>"Close"</button>
            </div>
        </div>
    })
}
