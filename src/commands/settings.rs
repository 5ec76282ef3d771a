// Tauri commands for app settings management
// Only the Gemini API key is configurable; it lives in the OS keychain.

use log::warn;

use crate::ai::CredentialManager;

/// Set the Gemini API key (stores in keychain)
#[tauri::command]
pub async fn set_ai_api_key(api_key: String) -> Result<(), String> {
    if api_key.trim().is_empty() {
        return Err("API key cannot be empty".to_string());
    }

    CredentialManager::store_api_key(&api_key).map_err(|e| e.to_string())
}

/// Get API key status (whether one is configured)
#[tauri::command]
pub async fn get_ai_api_key_status() -> Result<bool, String> {
    match CredentialManager::has_api_key() {
        Ok(configured) => Ok(configured),
        Err(e) => {
            warn!("Error checking API key status: {}", e);
            Ok(false)
        }
    }
}

/// Delete the stored API key
#[tauri::command]
pub async fn delete_ai_api_key() -> Result<(), String> {
    CredentialManager::delete_api_key().map_err(|e| format!("Failed to delete API key: {}", e))
}
