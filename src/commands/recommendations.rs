// Tauri commands for the recommendation screen
//
// Thin wrappers around `RecommendationController`; every transition is
// also broadcast as the `recommendations-state-changed` event from `run()`.

use tauri::{AppHandle, State};
use tauri_plugin_opener::OpenerExt;

use crate::session::{RecommendationController, RecommendationSnapshot, SUGGESTED_THEMES};
use crate::song::Song;

/// Application state shared by all commands
pub struct AppState {
    pub controller: RecommendationController,
}

#[tauri::command]
pub async fn get_recommendation_state(
    state: State<'_, AppState>,
) -> Result<RecommendationSnapshot, String> {
    Ok(state.controller.snapshot().await)
}

/// Replace the theme text (allowed while a request is in flight)
#[tauri::command]
pub async fn set_theme(
    state: State<'_, AppState>,
    theme: String,
) -> Result<RecommendationSnapshot, String> {
    Ok(state.controller.set_theme(theme).await)
}

/// Fetch songs for a theme. Resolves once the provider has answered.
#[tauri::command]
pub async fn submit_theme(
    state: State<'_, AppState>,
    theme: String,
) -> Result<RecommendationSnapshot, String> {
    Ok(state.controller.submit(theme).await)
}

#[tauri::command]
pub async fn refresh_recommendations(
    state: State<'_, AppState>,
) -> Result<RecommendationSnapshot, String> {
    Ok(state.controller.refresh().await)
}

#[tauri::command]
pub async fn reset_recommendations(
    state: State<'_, AppState>,
) -> Result<RecommendationSnapshot, String> {
    Ok(state.controller.reset().await)
}

/// Quick-pick themes for the empty screen; picking one goes through `set_theme`
#[tauri::command]
pub fn get_suggested_themes() -> Vec<String> {
    SUGGESTED_THEMES.iter().map(|tag| tag.to_string()).collect()
}

#[tauri::command]
pub fn song_search_url(song: Song) -> String {
    song.search_url()
}

/// Open the video search for a song in the default browser
#[tauri::command]
pub fn open_song_search(app: AppHandle, song: Song) -> Result<(), String> {
    let url = song.search_url();
    log::debug!("Opening {}", url);
    app.opener()
        .open_url(url, None::<&str>)
        .map_err(|e| format!("Failed to open browser: {}", e))
}
