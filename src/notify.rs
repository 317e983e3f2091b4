//! User notifications

pub const INCOMPLETE_ENTRY_MESSAGE: &str = "Please fill in all fields before saving.";

/// Blocking browser alert. Also logged to the console.
pub fn alert(message: &str) {
    web_sys::console::warn_1(&message.into());
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

/// Report a failed backend call
pub fn command_failed(action: &str, error: &str) {
    alert(&format!("Could not {}: {}", action, error));
}
