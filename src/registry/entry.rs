//! Session entry
//!
//! The per-session store: the shot cache in sequence order, the idempotency
//! index, consumer cursors, roster and basket-side state, and the pause and
//! reset flags. One entry sits behind one mutex; the poller merges snapshots
//! into it and the delivery operations read from it.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::feed::{RawAction, StartingLineups};
use crate::ingest::{
    classify, Classified, CourtMapper, Direction, IdempotencyKey, Placement, RosterSnapshot,
    RosterTracker, ScoringAction,
};
use crate::stats::SessionStats;

use super::config::RegistryConfig;
use super::delivery::DeliveryCursor;
use super::id::{ConsumerId, SessionId};

/// Placeholder labels used until a lookup or the caller supplies real ones
pub const DEFAULT_HOME_LABEL: &str = "HOME";
pub const DEFAULT_AWAY_LABEL: &str = "AWAY";

/// Home and away team labels (tricodes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamLabels {
    pub home: String,
    pub away: String,
}

impl TeamLabels {
    pub fn new(home: impl AsRef<str>, away: impl AsRef<str>) -> Self {
        Self {
            home: home.as_ref().trim().to_ascii_uppercase(),
            away: away.as_ref().trim().to_ascii_uppercase(),
        }
    }

    /// Whether these are still the placeholder labels
    pub fn is_placeholder(&self) -> bool {
        self.home == DEFAULT_HOME_LABEL || self.away == DEFAULT_AWAY_LABEL
    }
}

impl Default for TeamLabels {
    fn default() -> Self {
        Self::new(DEFAULT_HOME_LABEL, DEFAULT_AWAY_LABEL)
    }
}

/// A scoring event as cached, enriched at ingestion time
#[derive(Debug, Clone)]
pub struct ShotRecord {
    /// Position in ingestion order, starting at 1
    pub sequence: u64,
    pub action: ScoringAction,
    pub placement: Placement,
    /// On-court players when the shot was ingested
    pub roster: RosterSnapshot,
}

/// Outcome of merging one upstream snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub seen: usize,
    pub added: usize,
    pub duplicates: usize,
    pub ignored: usize,
    pub roster_changes: usize,
    pub roster_anomalies: usize,
}

/// Mutable state of one session
pub struct SessionEntry {
    /// Session this entry belongs to
    pub session_id: SessionId,

    /// Upstream source (game id)
    pub source_id: String,

    /// Home/away labels
    pub labels: TeamLabels,

    /// Deliveries return no content while set; ingestion continues
    pub paused: bool,

    /// Surfaced once to the first delivery call after (re)start
    pub(super) just_reset: bool,

    /// When the session was (re)started
    pub created_at: Instant,

    /// Cached shots; `records[i].sequence == i + 1`
    pub(super) records: Vec<ShotRecord>,

    /// Idempotency key -> sequence number
    keys: HashMap<IdempotencyKey, u64>,

    /// Substitutions already applied
    applied_changes: HashSet<IdempotencyKey>,

    /// Per-consumer delivery cursors
    pub(super) cursors: HashMap<ConsumerId, DeliveryCursor>,

    roster: RosterTracker,
    mapper: CourtMapper,
    pub(super) stats: SessionStats,
    roster_log_len: usize,
}

impl SessionEntry {
    /// Create a fresh entry with the reset flag raised
    pub fn new(
        session_id: SessionId,
        source_id: impl Into<String>,
        labels: TeamLabels,
        config: &RegistryConfig,
    ) -> Self {
        Self {
            session_id,
            source_id: source_id.into(),
            labels,
            paused: false,
            just_reset: true,
            created_at: Instant::now(),
            records: Vec::new(),
            keys: HashMap::new(),
            applied_changes: HashSet::new(),
            cursors: HashMap::new(),
            roster: RosterTracker::new(config.roster_capacity),
            mapper: CourtMapper::new(config.grid),
            stats: SessionStats::new(),
            roster_log_len: config.roster_log_len,
        }
    }

    /// Seed the on-court sets from a starter lookup
    pub fn seed_lineups(&mut self, lineups: &StartingLineups) {
        self.roster
            .seed(&self.labels.home, lineups.home.starters.iter().cloned());
        self.roster
            .seed(&self.labels.away, lineups.away.starters.iter().cloned());
    }

    /// Merge a full upstream snapshot.
    ///
    /// Records are processed in snapshot order. Scoring records already in
    /// the cache and substitutions already applied are skipped, so merging
    /// the same snapshot twice changes nothing.
    pub fn ingest(&mut self, actions: &[RawAction]) -> IngestReport {
        let mut report = IngestReport::default();

        for action in actions {
            report.seen += 1;

            match classify(action) {
                Classified::Ignored(reason) => {
                    report.ignored += 1;
                    tracing::trace!(
                        session = %self.session_id,
                        action_number = ?action.action_number,
                        reason = ?reason,
                        "Record ignored"
                    );
                }
                Classified::RosterChange(change) => {
                    if !self.applied_changes.insert(change.key.clone()) {
                        continue;
                    }

                    let outcome = self.roster.apply(&change);
                    report.roster_changes += 1;

                    let direction = match change.direction {
                        Direction::Enter => "IN",
                        Direction::Leave => "OUT",
                    };
                    self.stats.log_substitution(
                        format!("SUB {} {}: personId={}", change.team, direction, change.actor_id),
                        self.roster_log_len,
                    );

                    if outcome.is_anomaly() {
                        report.roster_anomalies += 1;
                        tracing::warn!(
                            session = %self.session_id,
                            team = %change.team,
                            actor = change.actor_id,
                            outcome = ?outcome,
                            "Roster inconsistency"
                        );
                    }
                }
                Classified::Scoring(shot) => {
                    if self.keys.contains_key(&shot.key) {
                        report.duplicates += 1;
                        continue;
                    }

                    self.insert_shot(shot);
                    report.added += 1;
                }
            }
        }

        self.stats.polls += 1;
        self.stats.records_seen += report.seen as u64;
        self.stats.shots_ingested += report.added as u64;
        self.stats.duplicates_skipped += report.duplicates as u64;
        self.stats.records_ignored += report.ignored as u64;
        self.stats.roster_changes += report.roster_changes as u64;
        self.stats.roster_anomalies += report.roster_anomalies as u64;

        report
    }

    fn insert_shot(&mut self, shot: ScoringAction) {
        let sequence = self.records.len() as u64 + 1;

        self.roster.learn_name(shot.actor_id, &shot.player);
        let placement = self.mapper.place(&shot, &self.labels.home);
        let roster = self.roster.snapshot(&self.labels.home, &self.labels.away);

        tracing::debug!(
            session = %self.session_id,
            sequence = sequence,
            key = %shot.key,
            team = %shot.team,
            outcome = shot.outcome.as_str(),
            x = placement.x,
            y = placement.y,
            "Shot ingested"
        );

        self.keys.insert(shot.key.clone(), sequence);
        self.records.push(ShotRecord {
            sequence,
            action: shot,
            placement,
            roster,
        });
    }

    /// Number of cached shots
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cached shots in sequence order
    pub fn records(&self) -> &[ShotRecord] {
        &self.records
    }

    /// Look up a shot by sequence number
    pub fn record(&self, sequence: u64) -> Option<&ShotRecord> {
        let index = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.records.get(index)
    }

    /// Sequence number assigned to a key, if ingested
    pub fn sequence_of(&self, key: &IdempotencyKey) -> Option<u64> {
        self.keys.get(key).copied()
    }

    /// Current on-court state
    pub fn roster(&self) -> &RosterTracker {
        &self.roster
    }

    /// Basket-side and grid state
    pub fn mapper(&self) -> &CourtMapper {
        &self.mapper
    }

    /// Cursor of a consumer, if it has read from this session
    pub fn cursor(&self, consumer: &ConsumerId) -> Option<&DeliveryCursor> {
        self.cursors.get(consumer)
    }

    /// Statistics snapshot
    pub fn stats(&self) -> SessionStats {
        let mut stats = self.stats.clone();
        stats.uptime = self.created_at.elapsed();
        stats
    }

    /// Record a failed fetch
    pub fn record_fetch_failure(&mut self, error: impl ToString) {
        self.stats.record_fetch_failure(error);
    }
}

impl std::fmt::Debug for SessionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEntry")
            .field("session_id", &self.session_id)
            .field("source_id", &self.source_id)
            .field("labels", &self.labels)
            .field("paused", &self.paused)
            .field("records", &self.records.len())
            .field("consumers", &self.cursors.len())
            .finish()
    }
}
