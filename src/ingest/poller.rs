//! Background poller
//!
//! One task per session. Every tick it fetches the full snapshot for the
//! session's source and merges it into the session entry. A failed or slow
//! fetch is logged and counted; the loop carries on with the next tick.
//!
//! Shutdown is signalled through a `watch` channel and is observed both
//! between ticks and while a fetch is in flight, so a stop never waits on the
//! network.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

use crate::feed::{FeedError, FeedSource, RawAction};
use crate::registry::entry::SessionEntry;
use crate::registry::id::SessionId;

/// Everything a poller needs to run
pub struct PollerContext<F: FeedSource> {
    pub session_id: SessionId,
    pub source_id: String,
    pub feed: Arc<F>,
    pub store: Arc<Mutex<SessionEntry>>,
    pub interval: Duration,
    pub fetch_timeout: Duration,
}

/// Handle to a running poller
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Whether the task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the poller and wait for it to exit
    pub async fn shutdown(self) -> Result<(), JoinError> {
        // Receiver gone means the task already exited
        let _ = self.shutdown.send(true);
        self.task.await
    }
}

/// Start a poller for a session
pub fn spawn<F: FeedSource>(ctx: PollerContext<F>) -> PollerHandle {
    let (shutdown, rx) = watch::channel(false);
    let task = tokio::spawn(run(ctx, rx));
    PollerHandle { shutdown, task }
}

async fn run<F: FeedSource>(ctx: PollerContext<F>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        session = %ctx.session_id,
        source = %ctx.source_id,
        interval_ms = ctx.interval.as_millis() as u64,
        "Poller started"
    );

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            result = fetch(&ctx) => result,
        };

        let mut entry = ctx.store.lock().await;
        match fetched {
            Ok(actions) => {
                let report = entry.ingest(&actions);
                if report.added > 0 || report.roster_changes > 0 {
                    tracing::info!(
                        session = %ctx.session_id,
                        seen = report.seen,
                        added = report.added,
                        roster_changes = report.roster_changes,
                        total = entry.len(),
                        "Snapshot merged"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    session = %ctx.session_id,
                    source = %ctx.source_id,
                    error = %e,
                    "Snapshot fetch failed"
                );
                entry.record_fetch_failure(e);
            }
        }
    }

    tracing::info!(session = %ctx.session_id, "Poller stopped");
}

async fn fetch<F: FeedSource>(ctx: &PollerContext<F>) -> Result<Vec<RawAction>, FeedError> {
    match tokio::time::timeout(ctx.fetch_timeout, ctx.feed.fetch_actions(&ctx.source_id)).await {
        Ok(result) => result,
        Err(_) => Err(FeedError::Timeout(ctx.fetch_timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::StaticFeed;
    use crate::registry::entry::tests::{entry, shot};

    fn context(
        feed: Arc<StaticFeed>,
        store: Arc<Mutex<SessionEntry>>,
    ) -> PollerContext<StaticFeed> {
        PollerContext {
            session_id: SessionId::parse("board").unwrap(),
            source_id: "0022400061".into(),
            feed,
            store,
            interval: Duration::from_millis(100),
            fetch_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_ingests_snapshots() {
        let feed = Arc::new(StaticFeed::with_actions(vec![shot(
            "2024-10-22T23:42:10Z",
            1,
            "BOS",
            "Made",
        )]));
        let store = Arc::new(Mutex::new(entry()));
        let handle = spawn(context(Arc::clone(&feed), Arc::clone(&store)));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(store.lock().await.len(), 1);

        feed.push_actions([shot("2024-10-22T23:43:00Z", 2, "NYK", "Missed")]);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.lock().await.len(), 2);

        handle.shutdown().await.unwrap();
        let polls = feed.fetch_count();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(feed.fetch_count(), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_survives_fetch_failures() {
        let feed = Arc::new(StaticFeed::with_actions(vec![shot(
            "2024-10-22T23:42:10Z",
            1,
            "BOS",
            "Made",
        )]));
        feed.fail_next(2);
        let store = Arc::new(Mutex::new(entry()));
        let handle = spawn(context(Arc::clone(&feed), Arc::clone(&store)));

        tokio::time::sleep(Duration::from_millis(350)).await;
        {
            let entry = store.lock().await;
            assert_eq!(entry.len(), 1);
            assert_eq!(entry.stats().fetch_failures, 2);
            assert!(entry.stats().last_fetch_error.is_some());
        }

        handle.shutdown().await.unwrap();
    }
}
