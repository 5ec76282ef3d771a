// Error types shared by the AI client and the session controller
//
// Full diagnostics stay in `Display` for the logs; the web view only ever
// sees `user_message()`.

use thiserror::Error;

const TRANSPORT_MESSAGE: &str = "실패했습니다. 다시 시도해 주세요.";
const VALIDATION_MESSAGE: &str = "추천 목록을 불러오는 중 오류가 발생했습니다.";
const MISSING_KEY_MESSAGE: &str =
    "API 키가 설정되지 않았습니다. 설정에서 Gemini API 키를 입력해 주세요.";

/// Failure of a single recommendation call
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to provider failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("provider response did not match the schema: {0}")]
    Validation(String),

    #[error("no Gemini API key configured")]
    MissingApiKey,
}

impl ProviderError {
    /// Short human-readable message stored in the interaction state.
    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderError::Transport(_) | ProviderError::Api { .. } => TRANSPORT_MESSAGE,
            ProviderError::Validation(_) => VALIDATION_MESSAGE,
            ProviderError::MissingApiKey => MISSING_KEY_MESSAGE,
        }
    }

    #[cfg(test)]
    pub fn is_validation(&self) -> bool {
        matches!(self, ProviderError::Validation(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    /// The request URL never reaches the logs.
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transport(e.without_url())
    }
}

/// Keychain failures and rejected keys
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key appears too short. Please check and try again.")]
    TooShort,

    #[error("API key must not contain whitespace")]
    Whitespace,

    #[error("keychain error: {0}")]
    Keychain(#[from] keyring::Error),
}
