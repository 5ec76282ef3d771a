// Modules
pub mod ai;
pub mod commands;
pub mod error;
pub mod session;
pub mod song;

use std::sync::Arc;

use ai::{GeminiClient, GeminiConfig};
use commands::AppState;
use session::RecommendationController;
use tauri::{Emitter, Manager};

/// Event carrying a `RecommendationSnapshot` after every state transition
pub const STATE_CHANGED_EVENT: &str = "recommendations-state-changed";

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("Commute Vibes starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let client = GeminiClient::new(GeminiConfig::default())?;
            let controller = RecommendationController::new(Arc::new(client));

            // Forward controller changes to the web view
            let mut changes = controller.subscribe();
            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                while changes.changed().await.is_ok() {
                    let snapshot = changes.borrow_and_update().clone();
                    if let Err(e) = handle.emit(STATE_CHANGED_EVENT, snapshot) {
                        log::warn!("Failed to emit {}: {}", STATE_CHANGED_EVENT, e);
                    }
                }
            });

            app.manage(AppState { controller });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Recommendation commands
            commands::recommendations::get_recommendation_state,
            commands::recommendations::set_theme,
            commands::recommendations::submit_theme,
            commands::recommendations::refresh_recommendations,
            commands::recommendations::reset_recommendations,
            commands::recommendations::get_suggested_themes,
            commands::recommendations::song_search_url,
            commands::recommendations::open_song_search,
            // Settings commands
            commands::settings::set_ai_api_key,
            commands::settings::get_ai_api_key_status,
            commands::settings::delete_ai_api_key,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
