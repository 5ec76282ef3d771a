// Song value object and the helpers built around it
//
// Songs arrive from the recommendation provider as JSON; the field names
// follow the provider schema (camelCase) so the same shape is forwarded
// to the web view untouched.

use serde::{Deserialize, Serialize};

const YOUTUBE_SEARCH_URL: &str = "https://www.youtube.com/results?search_query=";

/// One recommended track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub title: String,
    pub artist: String,
    pub is_korean: bool,
    /// Why the song suits the commute
    pub description: String,
    pub genre: String,
}

/// Provider payload: `{ "songs": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub songs: Vec<Song>,
}

impl Song {
    /// Check the fields the provider is not trusted to fill in.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(format!("song by '{}' has an empty title", self.artist));
        }
        if self.artist.trim().is_empty() {
            return Err(format!("song '{}' has an empty artist", self.title));
        }
        Ok(())
    }

    /// Video search link for this song ("artist title").
    pub fn search_url(&self) -> String {
        let query = format!("{} {}", self.artist, self.title);
        format!("{}{}", YOUTUBE_SEARCH_URL, urlencoding::encode(&query))
    }
}
