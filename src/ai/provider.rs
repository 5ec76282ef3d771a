// Seam between the session controller and whatever produces songs

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::song::Song;

/// Anything that can turn a theme into a list of songs.
///
/// The controller filters blank themes before calling; implementations can
/// assume `theme.trim()` is non-empty.
#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    async fn recommend(&self, theme: &str) -> Result<Vec<Song>, ProviderError>;
}
