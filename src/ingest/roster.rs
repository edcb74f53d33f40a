//! On-court roster tracking
//!
//! Membership is derived from substitution records applied in the order the
//! poller first sees them. A leave for someone not on court, or a team
//! growing past its capacity, is reported back to the caller but never
//! rejected: the feed occasionally drops records and the tracker has to keep
//! going.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::classify::{Direction, RosterChange};

/// Players on court per team at ingestion time of a shot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterSnapshot {
    pub home: Vec<OnCourtPlayer>,
    pub away: Vec<OnCourtPlayer>,
}

/// One entry of a roster snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnCourtPlayer {
    pub id: u64,
    pub name: String,
}

/// Result of applying a roster change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterApply {
    /// Membership changed
    Applied,
    /// Enter for someone already on court (no-op)
    AlreadyOnCourt,
    /// Leave for someone not on court (no-op)
    NotOnCourt,
    /// Enter applied, but the team now exceeds capacity
    OverCapacity(usize),
}

impl RosterApply {
    /// Whether this outcome indicates a gap or error in the feed
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, RosterApply::Applied)
    }
}

/// Per-session on-court state
#[derive(Debug, Clone)]
pub struct RosterTracker {
    teams: HashMap<String, BTreeSet<u64>>,
    names: HashMap<u64, String>,
    capacity: usize,
}

impl RosterTracker {
    /// Create an empty tracker expecting `capacity` players per team
    pub fn new(capacity: usize) -> Self {
        Self {
            teams: HashMap::new(),
            names: HashMap::new(),
            capacity,
        }
    }

    /// Replace a team's on-court set with its starters
    pub fn seed(&mut self, team: &str, players: impl IntoIterator<Item = (u64, Option<String>)>) {
        let mut on_court = BTreeSet::new();
        for (id, name) in players {
            if let Some(name) = name {
                self.names.insert(id, name);
            }
            on_court.insert(id);
        }
        self.teams.insert(team.to_string(), on_court);
    }

    /// Remember a display name for an actor
    pub fn learn_name(&mut self, id: u64, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.names.entry(id).or_insert_with(|| name.to_string());
        }
    }

    /// Apply a substitution
    pub fn apply(&mut self, change: &RosterChange) -> RosterApply {
        if let Some(label) = change.actor_label.as_deref() {
            self.learn_name(change.actor_id, label);
        }

        let on_court = self.teams.entry(change.team.clone()).or_default();
        match change.direction {
            Direction::Enter => {
                if !on_court.insert(change.actor_id) {
                    RosterApply::AlreadyOnCourt
                } else if on_court.len() > self.capacity {
                    RosterApply::OverCapacity(on_court.len())
                } else {
                    RosterApply::Applied
                }
            }
            Direction::Leave => {
                if on_court.remove(&change.actor_id) {
                    RosterApply::Applied
                } else {
                    RosterApply::NotOnCourt
                }
            }
        }
    }

    /// Ids on court for `team`, ascending
    pub fn on_court(&self, team: &str) -> Vec<u64> {
        self.teams
            .get(team)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// All teams with their on-court ids
    pub fn teams(&self) -> BTreeMap<String, Vec<u64>> {
        self.teams
            .iter()
            .map(|(team, ids)| (team.clone(), ids.iter().copied().collect()))
            .collect()
    }

    /// Snapshot for embedding in a shot record
    pub fn snapshot(&self, home: &str, away: &str) -> RosterSnapshot {
        RosterSnapshot {
            home: self.players(home),
            away: self.players(away),
        }
    }

    fn players(&self, team: &str) -> Vec<OnCourtPlayer> {
        self.on_court(team)
            .into_iter()
            .map(|id| OnCourtPlayer {
                id,
                name: self
                    .names
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| id.to_string()),
            })
            .collect()
    }
}
