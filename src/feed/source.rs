//! Feed sources
//!
//! [`FeedSource`] is the seam between the pollers and the outside world.
//! [`HttpFeed`] talks to the live endpoints; [`StaticFeed`] serves an
//! in-memory snapshot that can be swapped at any time, which is how tests and
//! recorded-game replays drive the registry.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;

use super::action::{Boxscore, PlayByPlay, RawAction, StartingLineups};
use super::config::FeedConfig;
use super::error::FeedError;

/// Source of upstream snapshots for a game
///
/// Implementations must return the full list of actions to date on every
/// call; the ingestion side never assumes incremental delivery.
pub trait FeedSource: Send + Sync + 'static {
    /// Fetch the full play-by-play snapshot for `source_id`
    fn fetch_actions(
        &self,
        source_id: &str,
    ) -> impl Future<Output = Result<Vec<RawAction>, FeedError>> + Send;

    /// Fetch starters and team labels for `source_id`
    fn fetch_lineups(
        &self,
        source_id: &str,
    ) -> impl Future<Output = Result<StartingLineups, FeedError>> + Send;
}

/// HTTP source backed by the live-data JSON endpoints
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    config: FeedConfig,
}

impl HttpFeed {
    /// Create a source with the given configuration
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the feed configuration
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    async fn get(&self, url: &str) -> Result<Bytes, FeedError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        tracing::trace!(url = url, bytes = body.len(), "Fetched upstream document");
        Ok(body)
    }
}

impl FeedSource for HttpFeed {
    async fn fetch_actions(&self, source_id: &str) -> Result<Vec<RawAction>, FeedError> {
        let body = self.get(&self.config.play_by_play_for(source_id)).await?;
        let doc: PlayByPlay = serde_json::from_slice(&body)?;
        Ok(doc.game.actions)
    }

    async fn fetch_lineups(&self, source_id: &str) -> Result<StartingLineups, FeedError> {
        let body = self.get(&self.config.boxscore_for(source_id)).await?;
        let doc: Boxscore = serde_json::from_slice(&body)?;
        Ok(doc.into())
    }
}

/// In-memory source serving a replaceable snapshot
///
/// The same snapshot is served for every source id.
#[derive(Debug, Default)]
pub struct StaticFeed {
    actions: Mutex<Vec<RawAction>>,
    lineups: Mutex<Option<StartingLineups>>,
    failures_pending: AtomicUsize,
    fetches: AtomicU64,
}

impl StaticFeed {
    /// Create an empty feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a feed serving `actions`
    pub fn with_actions(actions: Vec<RawAction>) -> Self {
        let feed = Self::new();
        feed.set_actions(actions);
        feed
    }

    /// Replace the served snapshot
    pub fn set_actions(&self, actions: Vec<RawAction>) {
        *self.actions.lock().unwrap_or_else(PoisonError::into_inner) = actions;
    }

    /// Append to the served snapshot, as a live game would
    pub fn push_actions(&self, actions: impl IntoIterator<Item = RawAction>) {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(actions);
    }

    /// Set the lineups returned by the roster lookup (`None` makes it fail)
    pub fn set_lineups(&self, lineups: Option<StartingLineups>) {
        *self.lineups.lock().unwrap_or_else(PoisonError::into_inner) = lineups;
    }

    /// Make the next `count` snapshot fetches fail
    pub fn fail_next(&self, count: usize) {
        self.failures_pending.store(count, Ordering::SeqCst);
    }

    /// Number of snapshot fetches served or failed so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl FeedSource for StaticFeed {
    async fn fetch_actions(&self, _source_id: &str) -> Result<Vec<RawAction>, FeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(FeedError::Unavailable("injected failure".into()));
        }

        Ok(self
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn fetch_lineups(&self, _source_id: &str) -> Result<StartingLineups, FeedError> {
        self.lineups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| FeedError::Unavailable("no lineups configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::Router;
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    const MIXED_SNAPSHOT: &str = r#"{"game": {"gameId": "mixed", "actions": [
        {"actionNumber": 4, "timeActual": "2024-10-22T23:42:10Z", "period": 1,
         "teamTricode": "BOS", "personId": 1, "shotResult": "Made", "actionType": "2pt"},
        {"actionNumber": 5, "timeActual": "2024-10-22T23:42:30Z", "period": "2",
         "teamTricode": "NYK", "personId": "abc", "shotResult": "Missed", "actionType": "2pt"}
    ]}}"#;

    async fn upstream(Path(game): Path<String>) -> Response {
        match game.as_str() {
            "down" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
            "garbled" => "<html>gateway error</html>".into_response(),
            _ => MIXED_SNAPSHOT.into_response(),
        }
    }

    /// Serve canned upstream documents on a loopback port
    async fn stub_upstream() -> FeedConfig {
        let app = Router::new()
            .route("/playbyplay/:game", get(upstream))
            .route("/boxscore/:game", get(upstream));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        FeedConfig::default()
            .play_by_play_url(format!("http://{}/playbyplay/{{}}", addr))
            .boxscore_url(format!("http://{}/boxscore/{{}}", addr))
    }

    #[tokio::test]
    async fn test_static_feed_serves_snapshot() {
        let feed = StaticFeed::new();
        assert!(feed.fetch_actions("g").await.unwrap().is_empty());

        feed.push_actions([RawAction {
            action_number: Some(1),
            ..Default::default()
        }]);
        feed.push_actions([RawAction {
            action_number: Some(2),
            ..Default::default()
        }]);

        let actions = feed.fetch_actions("g").await.unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(feed.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_static_feed_injected_failures() {
        let feed = StaticFeed::with_actions(vec![RawAction::default()]);
        feed.fail_next(2);

        assert_err!(feed.fetch_actions("g").await);
        assert_err!(feed.fetch_actions("g").await);
        assert_eq!(assert_ok!(feed.fetch_actions("g").await).len(), 1);
        assert_eq!(feed.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_static_feed_lineups() {
        let feed = StaticFeed::new();
        assert!(matches!(
            feed.fetch_lineups("g").await,
            Err(FeedError::Unavailable(_))
        ));

        let lineups = StartingLineups::default();
        feed.set_lineups(Some(lineups.clone()));
        assert_eq!(feed.fetch_lineups("g").await.unwrap(), lineups);
    }

    #[tokio::test]
    async fn test_http_feed_non_success_status() {
        let feed = HttpFeed::new(stub_upstream().await).unwrap();

        match assert_err!(feed.fetch_actions("down").await) {
            FeedError::Status { url, status } => {
                assert_eq!(status, 503);
                assert!(url.ends_with("/playbyplay/down"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            feed.fetch_lineups("down").await,
            Err(FeedError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_http_feed_undecodable_body() {
        let feed = HttpFeed::new(stub_upstream().await).unwrap();

        assert!(matches!(
            feed.fetch_actions("garbled").await,
            Err(FeedError::Decode(_))
        ));
        assert!(matches!(
            feed.fetch_lineups("garbled").await,
            Err(FeedError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_http_feed_keeps_valid_records_beside_malformed_ones() {
        let feed = HttpFeed::new(stub_upstream().await).unwrap();

        let actions = assert_ok!(feed.fetch_actions("mixed").await);
        assert_eq!(actions.len(), 2);
        assert!(!actions[0].malformed);
        assert_eq!(actions[0].actor_id(), Some(1));
        assert!(actions[1].malformed);
        assert_eq!(actions[1].action_number, Some(5));
    }

    #[test]
    fn test_http_feed_builds() {
        let feed = HttpFeed::new(FeedConfig::default()).unwrap();
        assert_eq!(feed.config().request_timeout, FeedConfig::default().request_timeout);
    }
}
