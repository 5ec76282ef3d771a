// Gemini API client for schema-constrained song recommendations
//
// Implements communication with Google's Gemini `generateContent` endpoint:
// - One request per theme, with the response schema attached
// - Parsing and local validation of the returned songs
// - Error mapping into user-facing messages (see `ProviderError`)

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::credentials::CredentialManager;
use super::provider::RecommendationProvider;
use super::recommendation_prompt::{
    build_instruction, response_schema, KOREAN_SONG_COUNT, SONG_COUNT,
};
use crate::error::{CredentialError, ProviderError};
use crate::song::{RecommendationResponse, Song};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-3-flash-preview";
const JSON_MIME_TYPE: &str = "application/json";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Where the client gets its API key from
#[derive(Debug, Clone)]
pub enum ApiKeySource {
    /// Environment, then keychain, looked up on every request
    Resolve,
    Fixed(String),
}

/// Client settings. `Default` talks to the public endpoint with no timeout.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Option<Duration>,
    pub api_key: ApiKeySource,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: GEMINI_API_URL.to_string(),
            model: GEMINI_MODEL.to_string(),
            timeout: None,
            api_key: ApiKeySource::Resolve,
        }
    }
}

impl GeminiConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = ApiKeySource::Fixed(api_key.into());
        self
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

/// Request to the generateContent endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

/// Response from the generateContent endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn api_key(&self) -> Result<String, ProviderError> {
        match &self.config.api_key {
            ApiKeySource::Fixed(key) => Ok(key.clone()),
            ApiKeySource::Resolve => Self::require_key(CredentialManager::resolve_api_key()),
        }
    }

    /// A missing or unreadable key is reported as `MissingApiKey`.
    fn require_key(
        resolved: Result<Option<String>, CredentialError>,
    ) -> Result<String, ProviderError> {
        match resolved {
            Ok(Some(key)) => Ok(key),
            Ok(None) => Err(ProviderError::MissingApiKey),
            Err(e) => {
                warn!("Could not read API key: {}", e);
                Err(ProviderError::MissingApiKey)
            }
        }
    }

    /// Ask the model for commute songs matching `theme`
    pub async fn generate_recommendations(&self, theme: &str) -> Result<Vec<Song>, ProviderError> {
        let api_key = self.api_key()?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: build_instruction(theme),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE,
                response_schema: response_schema(),
            },
        };

        debug!("Requesting recommendations from {} for theme {:?}", self.config.model, theme);

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .header(header::CONTENT_TYPE, JSON_MIME_TYPE)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = Self::candidate_text(&body)?;
        Self::parse_songs(&text)
    }

    /// Pull the generated text out of the response envelope
    fn candidate_text(body: &str) -> Result<String, ProviderError> {
        let envelope: GenerateContentResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::Validation(format!("unreadable response envelope: {}", e)))?;

        if let Some(reason) = envelope.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::Validation(format!("prompt blocked: {}", reason)));
        }

        let candidate = envelope
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Validation("response has no candidates".to_string()))?;

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(ProviderError::Validation(format!(
                "candidate has no text (finish reason: {})",
                reason
            )));
        }

        Ok(text)
    }

    /// Parse and validate the `{ songs: [...] }` payload
    fn parse_songs(text: &str) -> Result<Vec<Song>, ProviderError> {
        let json_text = Self::extract_json(text)?;

        let parsed: RecommendationResponse = serde_json::from_str(json_text)
            .map_err(|e| ProviderError::Validation(format!("invalid songs payload: {}", e)))?;

        for (index, song) in parsed.songs.iter().enumerate() {
            song.validate()
                .map_err(|reason| ProviderError::Validation(format!("song #{}: {}", index + 1, reason)))?;
        }

        let korean = parsed.songs.iter().filter(|song| song.is_korean).count();
        if parsed.songs.len() != SONG_COUNT || korean != KOREAN_SONG_COUNT {
            warn!(
                "Provider returned {} songs ({} Korean), expected {} ({} Korean)",
                parsed.songs.len(),
                korean,
                SONG_COUNT,
                KOREAN_SONG_COUNT
            );
        }

        Ok(parsed.songs)
    }

    /// Strip a Markdown code fence if the model wrapped its JSON in one
    fn extract_json(text: &str) -> Result<&str, ProviderError> {
        let trimmed = text.trim();
        if trimmed.starts_with('{') {
            return Ok(trimmed);
        }

        if let Some(start) = trimmed.find("```") {
            let after_fence = &trimmed[start + 3..];
            // Skip the language tag, if any
            let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
            let body = &after_fence[body_start..];
            if let Some(end) = body.find("```") {
                return Ok(body[..end].trim());
            }
        }

        match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if start < end => Ok(&trimmed[start..=end]),
            _ => Err(ProviderError::Validation("no JSON object in response".to_string())),
        }
    }
}

#[async_trait]
impl RecommendationProvider for GeminiClient {
    async fn recommend(&self, theme: &str) -> Result<Vec<Song>, ProviderError> {
        match self.generate_recommendations(theme).await {
            Ok(songs) => {
                info!("Received {} recommendations", songs.len());
                Ok(songs)
            }
            Err(e) => {
                error!("Recommendation request failed: {}", e);
                Err(e)
            }
        }
    }
}
