// AI module for Gemini API integration and song recommendations
//
// This module provides:
// - Gemini API client with schema-constrained JSON output
// - Secure credential storage via OS keychain
// - The instruction and response schema sent with each request
// - The provider trait the session controller depends on

pub mod credentials;
pub mod gemini_client;
pub mod provider;
pub mod recommendation_prompt;

// Re-export commonly used types
pub use credentials::CredentialManager;
pub use gemini_client::{ApiKeySource, GeminiClient, GeminiConfig};
pub use provider::RecommendationProvider;
