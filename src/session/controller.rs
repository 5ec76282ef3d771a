// Recommendation controller
//
// Runs submit/refresh/reset/set_theme against the shared state and
// publishes a snapshot after every transition.

use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use super::{InteractionState, ViewStatus};
use crate::ai::RecommendationProvider;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendationSnapshot {
    pub state: InteractionState,
    pub status: ViewStatus,
}

impl From<&InteractionState> for RecommendationSnapshot {
    fn from(state: &InteractionState) -> Self {
        Self {
            status: state.status(),
            state: state.clone(),
        }
    }
}

/// Owns the interaction state and runs the submit/refresh/reset transitions.
///
/// The state lock is never held across the provider call, so `set_theme`
/// and snapshots stay responsive while a request is in flight.
#[derive(Clone)]
pub struct RecommendationController {
    state: Arc<Mutex<InteractionState>>,
    provider: Arc<dyn RecommendationProvider>,
    changes: Arc<watch::Sender<RecommendationSnapshot>>,
}

impl RecommendationController {
    pub fn new(provider: Arc<dyn RecommendationProvider>) -> Self {
        let initial = InteractionState::new();
        let (changes, _) = watch::channel(RecommendationSnapshot::from(&initial));

        Self {
            state: Arc::new(Mutex::new(initial)),
            provider,
            changes: Arc::new(changes),
        }
    }

    /// Receive every snapshot published after a transition.
    pub fn subscribe(&self) -> watch::Receiver<RecommendationSnapshot> {
        self.changes.subscribe()
    }

    pub async fn snapshot(&self) -> RecommendationSnapshot {
        RecommendationSnapshot::from(&*self.state.lock().await)
    }

    pub async fn set_theme(&self, theme: String) -> RecommendationSnapshot {
        let mut guard = self.state.lock().await;
        guard.theme = theme;
        self.publish(&guard)
    }

    /// Request songs for `theme`. Blank themes are ignored.
    pub async fn submit(&self, theme: String) -> RecommendationSnapshot {
        if theme.trim().is_empty() {
            debug!("Ignoring submit with a blank theme");
            return self.snapshot().await;
        }

        let token = {
            let mut guard = self.state.lock().await;
            guard.theme = theme.clone();
            let token = guard.begin_request();
            self.publish(&guard);
            token
        };

        info!("Requesting recommendations (request #{})", token);
        let result = self.provider.recommend(&theme).await;

        let mut guard = self.state.lock().await;
        if !guard.finish_request(token, result) {
            info!(
                "Discarding stale response #{} (latest is #{})",
                token, guard.latest_request
            );
        }
        self.publish(&guard)
    }

    /// Re-run the current theme. Does nothing before the first successful search.
    pub async fn refresh(&self) -> RecommendationSnapshot {
        let theme = {
            let guard = self.state.lock().await;
            if !guard.has_searched {
                debug!("Ignoring refresh before the first search");
                return RecommendationSnapshot::from(&*guard);
            }
            guard.theme.clone()
        };

        self.submit(theme).await
    }

    pub async fn reset(&self) -> RecommendationSnapshot {
        let mut guard = self.state.lock().await;
        guard.reset();
        self.publish(&guard)
    }

    fn publish(&self, state: &InteractionState) -> RecommendationSnapshot {
        let snapshot = RecommendationSnapshot::from(state);
        // No subscribers is fine; keep the latest value for late ones.
        self.changes.send_replace(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::session::SUGGESTED_THEMES;
    use crate::song::Song;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    type Reply = Result<Vec<Song>, ProviderError>;

    /// Replays queued replies in order and records every theme it was asked for.
    struct ScriptedProvider {
        replies: std::sync::Mutex<VecDeque<Reply>>,
        calls: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn with_replies(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: std::sync::Mutex::new(replies.into()),
                calls: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecommendationProvider for ScriptedProvider {
        async fn recommend(&self, theme: &str) -> Result<Vec<Song>, ProviderError> {
            self.calls.lock().unwrap().push(theme.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Validation("no scripted reply".into())))
        }
    }

    /// Holds each call open until the test releases it.
    #[derive(Default)]
    struct GatedProvider {
        gates: std::sync::Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    }

    #[async_trait]
    impl RecommendationProvider for GatedProvider {
        async fn recommend(&self, _theme: &str) -> Result<Vec<Song>, ProviderError> {
            let gate = self.gates.lock().unwrap().pop_front().expect("unexpected call");
            gate.await.expect("gate dropped")
        }
    }

    fn songs(prefix: &str, korean: usize, international: usize) -> Vec<Song> {
        (0..korean + international)
            .map(|i| Song {
                title: format!("{} {}", prefix, i + 1),
                artist: format!("Artist {}", i + 1),
                is_korean: i < korean,
                description: "출근길에 딱".to_string(),
                genre: "City Pop".to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_blank_submit_changes_nothing() {
        let provider = ScriptedProvider::with_replies(vec![]);
        let controller = RecommendationController::new(provider.clone());
        let before = controller.snapshot().await;

        assert_eq!(controller.submit(String::new()).await, before);
        assert_eq!(controller.submit("   ".to_string()).await, before);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_city_pop_scenario() {
        let provider = ScriptedProvider::with_replies(vec![Ok(songs("city", 5, 2))]);
        let controller = RecommendationController::new(provider.clone());

        let snapshot = controller.submit("시티팝".to_string()).await;
        assert_eq!(provider.calls(), vec!["시티팝".to_string()]);
        assert_eq!(snapshot.state.songs.len(), 7);
        assert_eq!(snapshot.state.songs.iter().filter(|s| s.is_korean).count(), 5);
        assert!(snapshot.state.has_searched);
        assert!(!snapshot.state.is_loading);
        assert!(snapshot.state.error.is_none());
        assert_eq!(snapshot.status, ViewStatus::Loaded);
    }

    #[tokio::test]
    async fn test_any_song_count_replaces_results() {
        let provider = ScriptedProvider::with_replies(vec![Ok(songs("a", 5, 2)), Ok(songs("b", 0, 3))]);
        let controller = RecommendationController::new(provider);

        controller.submit("rain".to_string()).await;
        let snapshot = controller.submit("rain".to_string()).await;
        assert_eq!(snapshot.state.songs, songs("b", 0, 3));
    }

    #[tokio::test]
    async fn test_transport_failure_on_first_call() {
        let provider = ScriptedProvider::with_replies(vec![Err(ProviderError::Api {
            status: 500,
            body: "boom".into(),
        })]);
        let controller = RecommendationController::new(provider);

        let snapshot = controller.submit("night drive".to_string()).await;
        let error = snapshot.state.error.clone().unwrap();
        assert!(!error.is_empty());
        assert!(!error.contains("boom"));
        assert!(snapshot.state.songs.is_empty());
        assert!(!snapshot.state.is_loading);
        assert!(!snapshot.state.has_searched);
        assert_eq!(snapshot.status, ViewStatus::Failed);
    }

    #[tokio::test]
    async fn test_invalid_payload_keeps_previous_songs() {
        let provider = ScriptedProvider::with_replies(vec![
            Ok(songs("keep", 5, 2)),
            Err(ProviderError::Validation("expected value at line 1".into())),
        ]);
        let controller = RecommendationController::new(provider);

        controller.submit("indie".to_string()).await;
        let snapshot = controller.submit("indie".to_string()).await;

        assert_eq!(snapshot.state.songs, songs("keep", 5, 2));
        assert!(snapshot.state.has_searched);
        assert!(!snapshot.state.is_loading);
        assert!(!snapshot.state.error.unwrap().contains("line 1"));
    }

    #[tokio::test]
    async fn test_new_request_clears_previous_error() {
        let provider = ScriptedProvider::with_replies(vec![
            Err(ProviderError::MissingApiKey),
            Ok(songs("ok", 5, 2)),
        ]);
        let controller = RecommendationController::new(provider);

        assert!(controller.submit("ballad".to_string()).await.state.error.is_some());
        let snapshot = controller.submit("ballad".to_string()).await;
        assert!(snapshot.state.error.is_none());
        assert!(snapshot.state.has_searched);
    }

    #[tokio::test]
    async fn test_refresh_before_search_is_a_no_op() {
        let provider = ScriptedProvider::with_replies(vec![]);
        let controller = RecommendationController::new(provider.clone());
        controller.set_theme("jazz".to_string()).await;

        let snapshot = controller.refresh().await;
        assert!(!snapshot.state.is_loading);
        assert!(!snapshot.state.has_searched);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_twice_keeps_second_result() {
        let provider = ScriptedProvider::with_replies(vec![
            Ok(songs("first", 5, 2)),
            Ok(songs("second", 5, 2)),
            Ok(songs("third", 4, 3)),
        ]);
        let controller = RecommendationController::new(provider.clone());

        controller.submit("lofi".to_string()).await;
        controller.refresh().await;
        let snapshot = controller.refresh().await;

        assert_eq!(provider.calls(), vec!["lofi", "lofi", "lofi"]);
        assert_eq!(snapshot.state.songs, songs("third", 4, 3));
    }

    #[tokio::test]
    async fn test_refresh_uses_edited_theme() {
        let provider = ScriptedProvider::with_replies(vec![Ok(songs("a", 5, 2)), Ok(songs("b", 5, 2))]);
        let controller = RecommendationController::new(provider.clone());

        controller.submit("rock".to_string()).await;
        controller.set_theme("hip hop".to_string()).await;
        controller.refresh().await;

        assert_eq!(provider.calls(), vec!["rock", "hip hop"]);
    }

    #[tokio::test]
    async fn test_picking_suggested_theme_only_sets_theme() {
        let provider = ScriptedProvider::with_replies(vec![]);
        let controller = RecommendationController::new(provider.clone());
        let before = controller.snapshot().await;

        for tag in SUGGESTED_THEMES {
            let snapshot = controller.set_theme(tag.to_string()).await;
            assert_eq!(snapshot.state.theme, tag);
            assert_eq!(
                snapshot.state,
                InteractionState { theme: tag.to_string(), ..before.state.clone() }
            );
            assert_eq!(snapshot.status, ViewStatus::Idle);
        }
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_returns_to_initial_state() {
        let provider = ScriptedProvider::with_replies(vec![Ok(songs("a", 5, 2))]);
        let controller = RecommendationController::new(provider);

        controller.submit("summer".to_string()).await;
        let snapshot = controller.reset().await;

        assert_eq!(snapshot.state.theme, "");
        assert!(snapshot.state.songs.is_empty());
        assert!(!snapshot.state.has_searched);
        assert_eq!(snapshot.status, ViewStatus::Idle);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let provider = Arc::new(GatedProvider::default());
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        provider.gates.lock().unwrap().extend([first_rx, second_rx]);
        let controller = RecommendationController::new(provider);

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("first".to_string()).await }
        });
        wait_until_loading(&controller, 1).await;

        let second = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("second".to_string()).await }
        });
        wait_until_loading(&controller, 2).await;

        // Later request resolves first
        second_tx.send(Ok(songs("second", 5, 2))).unwrap();
        second.await.unwrap();
        first_tx.send(Ok(songs("first", 5, 2))).unwrap();
        first.await.unwrap();

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.state.songs, songs("second", 5, 2));
        assert_eq!(snapshot.state.theme, "second");
        assert!(!snapshot.state.is_loading);
    }

    #[tokio::test]
    async fn test_loading_stays_on_until_latest_resolves() {
        let provider = Arc::new(GatedProvider::default());
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        provider.gates.lock().unwrap().extend([first_rx, second_rx]);
        let controller = RecommendationController::new(provider);

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("a".to_string()).await }
        });
        wait_until_loading(&controller, 1).await;
        let second = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("b".to_string()).await }
        });
        wait_until_loading(&controller, 2).await;

        first_tx.send(Ok(songs("a", 5, 2))).unwrap();
        let after_first = first.await.unwrap();
        assert!(after_first.state.is_loading);
        assert!(after_first.state.songs.is_empty());

        second_tx.send(Err(ProviderError::Validation("bad".into()))).unwrap();
        let after_second = second.await.unwrap();
        assert!(!after_second.state.is_loading);
        assert!(after_second.state.error.is_some());
        assert!(after_second.state.songs.is_empty());
    }

    #[tokio::test]
    async fn test_reset_while_loading_discards_response() {
        let provider = Arc::new(GatedProvider::default());
        let (tx, rx) = oneshot::channel();
        provider.gates.lock().unwrap().push_back(rx);
        let controller = RecommendationController::new(provider);

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("late".to_string()).await }
        });
        wait_until_loading(&controller, 1).await;

        controller.reset().await;
        tx.send(Ok(songs("late", 5, 2))).unwrap();
        pending.await.unwrap();

        let snapshot = controller.snapshot().await;
        assert!(snapshot.state.songs.is_empty());
        assert!(!snapshot.state.has_searched);
        assert!(!snapshot.state.is_loading);
        assert_eq!(snapshot.state.theme, "");
    }

    #[tokio::test]
    async fn test_theme_editable_while_loading() {
        let provider = Arc::new(GatedProvider::default());
        let (tx, rx) = oneshot::channel();
        provider.gates.lock().unwrap().push_back(rx);
        let controller = RecommendationController::new(provider);

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("jazz".to_string()).await }
        });
        wait_until_loading(&controller, 1).await;

        let snapshot = controller.set_theme("jazz piano".to_string()).await;
        assert!(snapshot.state.is_loading);
        assert_eq!(snapshot.state.theme, "jazz piano");

        tx.send(Ok(songs("jazz", 5, 2))).unwrap();
        let done = pending.await.unwrap();
        assert_eq!(done.state.theme, "jazz piano");
        assert!(done.state.has_searched);
    }

    #[tokio::test]
    async fn test_subscribers_receive_latest_snapshot() {
        let provider = ScriptedProvider::with_replies(vec![Ok(songs("a", 5, 2))]);
        let controller = RecommendationController::new(provider);
        let mut changes = controller.subscribe();

        controller.submit("focus".to_string()).await;

        assert!(changes.has_changed().unwrap());
        let latest = changes.borrow_and_update().clone();
        assert_eq!(latest.status, ViewStatus::Loaded);
        assert_eq!(latest.state.songs.len(), 7);
    }

    /// Spin until the controller has dispatched `token` requests.
    async fn wait_until_loading(controller: &RecommendationController, token: u64) {
        loop {
            {
                let guard = controller.state.lock().await;
                if guard.latest_request >= token && guard.is_loading {
                    return;
                }
            }
            tokio::task::yield_now().await;
        }
    }
}
