// Gemini API key lookup and secure storage
//
// The process environment wins (GEMINI_API_KEY, then API_KEY). Otherwise
// the key saved from the settings screen is read from OS-native storage:
// - macOS: Keychain
// - Windows: Credential Manager
// - Linux: Secret Service (GNOME/KDE)

use keyring::Entry;
use log::{info, warn};

use crate::error::CredentialError;

const SERVICE_NAME: &str = "com.commutevibes.app";
const API_KEY_NAME: &str = "gemini_api_key";
const ENV_KEYS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];
const MIN_KEY_LEN: usize = 20;

pub struct CredentialManager;

impl CredentialManager {
    /// Resolve the key to use for the next request.
    pub fn resolve_api_key() -> Result<Option<String>, CredentialError> {
        Self::resolve_with(|name| std::env::var(name).ok(), Self::retrieve_api_key)
    }

    /// Environment first, keychain only when no variable is set.
    pub(crate) fn resolve_with(
        env: impl Fn(&str) -> Option<String>,
        keychain: impl FnOnce() -> Result<Option<String>, CredentialError>,
    ) -> Result<Option<String>, CredentialError> {
        match Self::key_from_env(env) {
            Some(key) => Ok(Some(key)),
            None => keychain(),
        }
    }

    /// First non-blank value among the supported environment variables.
    fn key_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        ENV_KEYS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    fn validate(key: &str) -> Result<(), CredentialError> {
        if key.chars().any(char::is_whitespace) {
            return Err(CredentialError::Whitespace);
        }
        if key.len() < MIN_KEY_LEN {
            return Err(CredentialError::TooShort);
        }
        Ok(())
    }

    /// Store the Gemini API key in the OS keychain
    pub fn store_api_key(key: &str) -> Result<(), CredentialError> {
        let key = key.trim();
        Self::validate(key)?;

        let entry = Entry::new(SERVICE_NAME, API_KEY_NAME)?;
        entry.set_password(key)?;

        info!("API key stored in keychain");
        Ok(())
    }

    /// Retrieve the Gemini API key from the OS keychain
    pub fn retrieve_api_key() -> Result<Option<String>, CredentialError> {
        let entry = Entry::new(SERVICE_NAME, API_KEY_NAME)?;

        match entry.get_password() {
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                warn!("Failed to retrieve API key: {}", e);
                Err(e.into())
            }
        }
    }

    /// Delete the Gemini API key from the OS keychain
    pub fn delete_api_key() -> Result<(), CredentialError> {
        let entry = Entry::new(SERVICE_NAME, API_KEY_NAME)?;

        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a key is available from any source (without returning it)
    pub fn has_api_key() -> Result<bool, CredentialError> {
        Ok(Self::resolve_api_key()?.is_some())
    }
}
