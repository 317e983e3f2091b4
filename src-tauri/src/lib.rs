//! Workout Log Backend
//!
//! Layered architecture:
//! - workout-store: Entry model and the document-backed entry store
//! - commands: Tauri command handlers

use std::path::Path;

use anyhow::Context;
use tauri::Manager;
use workout_store::config::{StoreConfig, CONFIG_FILE_NAME};
use workout_store::repository::EntryStore;

mod commands;

/// Application state shared across commands
pub struct AppState {
    pub entries: EntryStore,
}

/// Load `workout-log.toml` from the config dir, creating it on first run,
/// and open the configured backend.
fn open_entry_store(config_dir: &Path) -> anyhow::Result<EntryStore> {
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;
    let config = StoreConfig::load_with_env(&config_dir.join(CONFIG_FILE_NAME))?;
    let store = config
        .build_store(config_dir)
        .context("Failed to open the entry store")?;
    Ok(store)
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let result = tauri::Builder::default()
        .setup(|app| {
            // Single instance check - must be first!
            #[cfg(desktop)]
            app.handle().plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
                if let Some(window) = app.get_webview_window("main") {
                    let _ = window.set_focus();
                }
            }))?;

            rolling_logger::init_logger(app.path().app_log_dir()?, "WorkoutLog")?;

            let config_dir = app.path().app_config_dir()?;
            let entries = open_entry_store(&config_dir)?;
            rolling_logger::info(&format!(
                "Entry store ready: {} at {}",
                entries.backend_kind(),
                entries.target()
            ));

            app.manage(AppState { entries });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::list_entries,
            commands::add_entry,
            commands::delete_entry,
            commands::update_entry,
            commands::store_info,
        ])
        .run(tauri::generate_context!());

    if let Err(e) = result {
        rolling_logger::error(&format!("Application exited with error: {}", e));
        std::process::exit(1);
    }
}
