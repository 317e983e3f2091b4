//! Reads a picked image file into a `Photo` data URI.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::models::Photo;
use crate::notify;

/// Read `file` asynchronously and hand the encoded photo to `on_photo`.
/// Unreadable or non-image files are reported with an alert.
pub fn read_photo(file: web_sys::File, on_photo: impl FnOnce(Photo) + 'static) {
    let reader = match web_sys::FileReader::new() {
        Ok(reader) => reader,
        Err(_) => {
            notify::alert("Could not read the selected file.");
            return;
        }
    };

    let name = file.name();
    let declared_type = file.type_();
    let reader_clone = reader.clone();
    let onload = Closure::once_into_js(move |_: web_sys::Event| {
        let Ok(buffer) = reader_clone.result() else {
            notify::alert("Could not read the selected file.");
            return;
        };
        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
        match Photo::from_file(&name, &declared_type, &bytes) {
            Ok(photo) => on_photo(photo),
            Err(e) => notify::alert(&e.to_string()),
        }
    });
    reader.set_onload(Some(onload.unchecked_ref()));

    if reader.read_as_array_buffer(&file).is_err() {
        notify::alert("Could not read the selected file.");
    }
}
