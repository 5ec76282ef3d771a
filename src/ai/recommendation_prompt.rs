// Instruction and response schema for commute recommendations
//
// The schema is sent with every request as `generationConfig.responseSchema`
// so the model is constrained to the `{ songs: [...] }` shape.

use serde_json::{json, Value};

/// Number of songs requested per theme
pub const SONG_COUNT: usize = 7;
/// How many of those should be Korean releases
pub const KOREAN_SONG_COUNT: usize = 5;

/// Fields every song object must carry
pub const SONG_FIELDS: [&str; 5] = ["title", "artist", "isKorean", "description", "genre"];

/// Build the user instruction for a theme. The theme is embedded verbatim.
pub fn build_instruction(theme: &str) -> String {
    let international = SONG_COUNT - KOREAN_SONG_COUNT;
    format!(
        r#"사용자가 입력한 음악 취향/테마: "{theme}"

이 테마에 맞춰 출퇴근길(지하철, 버스 등)에서 듣기 좋은 노래 {SONG_COUNT}곡을 추천해 주세요.

규칙:
1. 정확히 {SONG_COUNT}곡을 추천할 것.
2. 한국 음악(K-Pop, K-Indie, K-Ballad 등) {KOREAN_SONG_COUNT}곡, 해외 음악 {international}곡으로 구성할 것.
3. 곡마다 출퇴근길에 어울리는 이유를 한국어로 짧게 설명할 것.
4. 응답은 반드시 지정된 JSON 스키마를 따를 것."#
    )
}

/// Response schema in the provider's OpenAPI subset (upper-case type names).
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "songs": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING", "description": "Song title" },
                        "artist": { "type": "STRING", "description": "Artist name" },
                        "isKorean": { "type": "BOOLEAN", "description": "True if it is a Korean song" },
                        "description": { "type": "STRING", "description": "Why it suits the commute" },
                        "genre": { "type": "STRING", "description": "Genre of the song" }
                    },
                    "required": SONG_FIELDS
                }
            }
        },
        "required": ["songs"]
    })
}
