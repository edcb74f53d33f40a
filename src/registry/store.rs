//! Session registry implementation
//!
//! The central registry that owns every session's store and poller, and
//! routes control and delivery calls to them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::feed::{FeedError, FeedSource, StartingLineups};
use crate::ingest::poller::{self, PollerContext, PollerHandle};
use crate::ingest::RosterSnapshot;
use crate::stats::SessionStats;

use super::config::RegistryConfig;
use super::delivery::{self, Delivery};
use super::entry::{SessionEntry, TeamLabels};
use super::error::RegistryError;
use super::id::{ConsumerId, SessionId};

/// Summary of a session, returned by `start` and `current_source`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub source_id: String,
    pub home_team: String,
    pub away_team: String,
    pub paused: bool,
    /// Shots cached so far
    pub shots: usize,
}

impl SessionInfo {
    fn of(entry: &SessionEntry) -> Self {
        Self {
            session_id: entry.session_id.to_string(),
            source_id: entry.source_id.clone(),
            home_team: entry.labels.home.clone(),
            away_team: entry.labels.away.clone(),
            paused: entry.paused,
            shots: entry.len(),
        }
    }
}

/// Poller ownership for one session id
struct SlotState {
    poller: Option<PollerHandle>,
    /// Slot was removed from the map; a racing start must not reuse it
    retired: bool,
}

/// One registered session
///
/// `store` keeps its identity across restarts; a restart replaces the entry
/// inside it. `state` is held for the whole of a start or stop, which is what
/// serializes lifecycle calls for one id.
struct SessionSlot {
    store: Arc<Mutex<SessionEntry>>,
    state: Mutex<SlotState>,
}

impl SessionSlot {
    fn new(entry: SessionEntry) -> Self {
        Self {
            store: Arc::new(Mutex::new(entry)),
            state: Mutex::new(SlotState {
                poller: None,
                retired: false,
            }),
        }
    }
}

/// Central registry for all sessions
///
/// Thread-safe via `RwLock`. Delivery calls only take the map's read lock
/// and then the session's own mutex, so sessions never contend with each
/// other.
pub struct SessionRegistry<F: FeedSource> {
    /// Map of session id to session slot
    sessions: RwLock<HashMap<SessionId, Arc<SessionSlot>>>,

    /// Upstream source shared by all pollers
    feed: Arc<F>,

    /// Configuration
    config: RegistryConfig,
}

impl<F: FeedSource> SessionRegistry<F> {
    /// Create a new registry with default configuration
    pub fn new(feed: Arc<F>) -> Self {
        Self::with_config(feed, RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(feed: Arc<F>, config: RegistryConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            feed,
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Get the upstream source
    pub fn feed(&self) -> &Arc<F> {
        &self.feed
    }

    /// Start (or restart) a session on a source.
    ///
    /// Any running poller for the session is stopped and joined first, so at
    /// most one poller per session exists at any time. The store is reset
    /// and the first delivery call afterwards returns [`Delivery::Reset`].
    /// Starters are looked up once; a failed lookup only leaves the rosters
    /// empty. Labels supplied by the caller win over looked-up ones.
    pub async fn start(
        &self,
        session_id: &str,
        source_id: &str,
        labels: Option<TeamLabels>,
    ) -> Result<SessionInfo, RegistryError> {
        let id = SessionId::parse(session_id)?;
        let source_id = source_id.trim();
        if source_id.is_empty() {
            return Err(RegistryError::InvalidId(source_id.to_string()));
        }

        loop {
            let existing = self.sessions.read().await.get(&id).cloned();

            match existing {
                Some(slot) => {
                    let mut state = slot.state.lock().await;
                    if state.retired {
                        // Stopped while we waited; start over on a fresh slot
                        continue;
                    }

                    if let Some(handle) = state.poller.take() {
                        if let Err(e) = handle.shutdown().await {
                            state.retired = true;
                            self.remove_slot(&id, &slot).await;
                            tracing::error!(
                                session = %id,
                                error = %e,
                                "Poller join failed, session dropped"
                            );
                            return Err(RegistryError::PollerJoin(id));
                        }
                    }

                    let entry = self.fresh_entry(&id, source_id, labels).await;
                    let info = SessionInfo::of(&entry);
                    *slot.store.lock().await = entry;
                    state.poller = Some(self.spawn_poller(&id, source_id, &slot));

                    tracing::info!(
                        session = %id,
                        source = source_id,
                        home = %info.home_team,
                        away = %info.away_team,
                        "Session restarted"
                    );
                    return Ok(info);
                }
                None => {
                    let entry = self.fresh_entry(&id, source_id, labels.clone()).await;
                    let info = SessionInfo::of(&entry);
                    let slot = Arc::new(SessionSlot::new(entry));
                    let mut state = slot.state.lock().await;

                    {
                        let mut sessions = self.sessions.write().await;
                        if sessions.contains_key(&id) {
                            // Lost a race with another start; go through the restart path
                            continue;
                        }
                        sessions.insert(id.clone(), Arc::clone(&slot));
                    }

                    state.poller = Some(self.spawn_poller(&id, source_id, &slot));

                    tracing::info!(
                        session = %id,
                        source = source_id,
                        home = %info.home_team,
                        away = %info.away_team,
                        "Session started"
                    );
                    return Ok(info);
                }
            }
        }
    }

    /// Stop a session: cancel and join its poller, then drop its store
    pub async fn stop(&self, session_id: &str) -> Result<(), RegistryError> {
        let id = SessionId::parse(session_id)?;
        let slot = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| RegistryError::SessionNotFound(id.clone()))?;

        Self::retire(&id, &slot).await?;
        tracing::info!(session = %id, "Session stopped");
        Ok(())
    }

    /// Stop every session
    pub async fn shutdown(&self) {
        let slots: Vec<(SessionId, Arc<SessionSlot>)> =
            self.sessions.write().await.drain().collect();
        let count = slots.len();

        for (id, slot) in slots {
            if let Err(e) = Self::retire(&id, &slot).await {
                tracing::error!(session = %id, error = %e, "Session did not stop cleanly");
            }
        }

        tracing::info!(sessions = count, "Registry shut down");
    }

    /// Hand out and acknowledge the next shot for a consumer
    pub async fn pop(&self, session_id: &str, consumer: &str) -> Result<Delivery, RegistryError> {
        let consumer = ConsumerId::parse(consumer)?;
        let store = self.store(session_id).await?;
        let mut entry = store.lock().await;
        Ok(delivery::pop(&mut entry, &consumer))
    }

    /// Return the next shot for a consumer without acknowledging it
    pub async fn peek(&self, session_id: &str, consumer: &str) -> Result<Delivery, RegistryError> {
        let consumer = ConsumerId::parse(consumer)?;
        let store = self.store(session_id).await?;
        let mut entry = store.lock().await;
        Ok(delivery::peek(&mut entry, &consumer))
    }

    /// Acknowledge a shot; `Ok(false)` if it already was
    pub async fn acknowledge(
        &self,
        session_id: &str,
        consumer: &str,
        sequence: u64,
    ) -> Result<bool, RegistryError> {
        let consumer = ConsumerId::parse(consumer)?;
        let store = self.store(session_id).await?;
        let mut entry = store.lock().await;
        delivery::acknowledge(&mut entry, &consumer, sequence)
    }

    /// Pause deliveries; ingestion continues
    pub async fn pause(&self, session_id: &str) -> Result<(), RegistryError> {
        self.set_paused(session_id, true).await
    }

    /// Resume deliveries
    pub async fn resume(&self, session_id: &str) -> Result<(), RegistryError> {
        self.set_paused(session_id, false).await
    }

    pub async fn is_paused(&self, session_id: &str) -> Result<bool, RegistryError> {
        let store = self.store(session_id).await?;
        let paused = store.lock().await.paused;
        Ok(paused)
    }

    /// Source and labels a session is currently tracking
    pub async fn current_source(&self, session_id: &str) -> Result<SessionInfo, RegistryError> {
        let store = self.store(session_id).await?;
        let entry = store.lock().await;
        Ok(SessionInfo::of(&entry))
    }

    /// Players currently on court
    pub async fn on_court(&self, session_id: &str) -> Result<RosterSnapshot, RegistryError> {
        let store = self.store(session_id).await?;
        let entry = store.lock().await;
        Ok(entry.roster().snapshot(&entry.labels.home, &entry.labels.away))
    }

    /// Get session statistics
    pub async fn session_stats(&self, session_id: &str) -> Result<SessionStats, RegistryError> {
        let store = self.store(session_id).await?;
        let stats = store.lock().await.stats();
        Ok(stats)
    }

    /// Get total number of sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of pollers currently running, across all sessions
    pub async fn poller_count(&self) -> usize {
        let slots: Vec<Arc<SessionSlot>> = self.sessions.read().await.values().cloned().collect();
        let mut running = 0;
        for slot in slots {
            let state = slot.state.lock().await;
            if state.poller.as_ref().is_some_and(|h| !h.is_finished()) {
                running += 1;
            }
        }
        running
    }

    async fn set_paused(&self, session_id: &str, paused: bool) -> Result<(), RegistryError> {
        let store = self.store(session_id).await?;
        let mut entry = store.lock().await;
        if entry.paused != paused {
            entry.paused = paused;
            tracing::info!(session = %entry.session_id, paused = paused, "Session pause toggled");
        }
        Ok(())
    }

    async fn store(&self, session_id: &str) -> Result<Arc<Mutex<SessionEntry>>, RegistryError> {
        let id = SessionId::parse(session_id)?;
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(|slot| Arc::clone(&slot.store))
            .ok_or(RegistryError::SessionNotFound(id))
    }

    async fn fresh_entry(
        &self,
        id: &SessionId,
        source_id: &str,
        labels: Option<TeamLabels>,
    ) -> SessionEntry {
        let lineups = self.lookup_lineups(id, source_id).await;

        let labels = labels.unwrap_or_else(|| {
            lineups
                .as_ref()
                .and_then(|l| Some(TeamLabels::new(l.home.label.as_ref()?, l.away.label.as_ref()?)))
                .unwrap_or_default()
        });

        let mut entry = SessionEntry::new(id.clone(), source_id, labels, &self.config);
        if let Some(lineups) = lineups {
            entry.seed_lineups(&lineups);
        }
        entry
    }

    async fn lookup_lineups(&self, id: &SessionId, source_id: &str) -> Option<StartingLineups> {
        let lookup = tokio::time::timeout(
            self.config.lookup_timeout,
            self.feed.fetch_lineups(source_id),
        )
        .await
        .unwrap_or(Err(FeedError::Timeout(self.config.lookup_timeout)));

        match lookup {
            Ok(lineups) => {
                tracing::debug!(
                    session = %id,
                    home_starters = lineups.home.starters.len(),
                    away_starters = lineups.away.starters.len(),
                    "Starters loaded"
                );
                Some(lineups)
            }
            Err(e) => {
                tracing::warn!(
                    session = %id,
                    source = source_id,
                    error = %e,
                    "Starter lookup failed"
                );
                None
            }
        }
    }

    fn spawn_poller(&self, id: &SessionId, source_id: &str, slot: &SessionSlot) -> PollerHandle {
        poller::spawn(PollerContext {
            session_id: id.clone(),
            source_id: source_id.to_string(),
            feed: Arc::clone(&self.feed),
            store: Arc::clone(&slot.store),
            interval: self.config.poll_interval,
            fetch_timeout: self.config.fetch_timeout,
        })
    }

    /// Remove `slot` from the map if it is still the registered one
    async fn remove_slot(&self, id: &SessionId, slot: &Arc<SessionSlot>) {
        let mut sessions = self.sessions.write().await;
        if sessions.get(id).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            sessions.remove(id);
        }
    }

    /// Retire a slot already removed from the map and join its poller
    async fn retire(id: &SessionId, slot: &SessionSlot) -> Result<(), RegistryError> {
        let mut state = slot.state.lock().await;
        state.retired = true;

        if let Some(handle) = state.poller.take() {
            if let Err(e) = handle.shutdown().await {
                tracing::error!(session = %id, error = %e, "Poller join failed");
                return Err(RegistryError::PollerJoin(id.clone()));
            }
        }
        Ok(())
    }
}
