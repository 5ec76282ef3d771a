// Interaction state for the recommendation screen
//
// Plain data plus the transitions the controller applies to it, so each
// step can be tested without a window.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::song::Song;

/// Quick-pick themes shown before the first search
pub const SUGGESTED_THEMES: [&str; 4] = ["시티팝", "몽환적인 밤", "파이팅 월요일", "비 오는 차창 밖"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ViewStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Everything the view needs to render the current screen
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionState {
    pub theme: String,
    pub songs: Vec<Song>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub has_searched: bool,
    /// Token of the most recently dispatched request. Responses carrying any
    /// other token are stale.
    #[serde(skip)]
    pub latest_request: u64,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ViewStatus {
        if self.is_loading {
            ViewStatus::Loading
        } else if self.error.is_some() {
            ViewStatus::Failed
        } else if self.has_searched {
            ViewStatus::Loaded
        } else {
            ViewStatus::Idle
        }
    }

    /// Mark a new request as in flight and hand back its token.
    pub fn begin_request(&mut self) -> u64 {
        self.latest_request += 1;
        self.error = None;
        self.is_loading = true;
        self.latest_request
    }

    /// Apply a provider result. Returns `false` if the result was stale and
    /// left the state untouched.
    pub fn finish_request(&mut self, token: u64, result: Result<Vec<Song>, ProviderError>) -> bool {
        if token != self.latest_request {
            return false;
        }

        self.is_loading = false;
        match result {
            Ok(songs) => {
                self.songs = songs;
                self.has_searched = true;
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.user_message().to_string());
            }
        }
        true
    }

    /// Back to the initial screen. Bumps the token so in-flight results are dropped.
    pub fn reset(&mut self) {
        *self = Self {
            latest_request: self.latest_request + 1,
            ..Self::default()
        };
    }
}
