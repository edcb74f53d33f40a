//! Delivery operations
//!
//! Stateless read/advance operations over a [`SessionEntry`]. Each consumer
//! owns a [`DeliveryCursor`]; the oldest shot whose sequence number is not in
//! the cursor's acknowledged set is the next one handed out.
//!
//! - `pop` returns that shot and acknowledges it in one step
//! - `peek` returns it without acknowledging; the consumer calls
//!   `acknowledge` once it has actually displayed the shot
//!
//! Both return [`Delivery::NoContent`] while the session is paused, and
//! [`Delivery::Reset`] once after each session (re)start.

use std::collections::HashSet;

use serde::Serialize;

use crate::ingest::RosterSnapshot;

use super::entry::{SessionEntry, ShotRecord, TeamLabels};
use super::error::RegistryError;
use super::id::ConsumerId;

/// Per-consumer delivery progress
///
/// `offset` is the index of the first record not yet acknowledged; it only
/// moves forward. The acknowledged set only grows.
#[derive(Debug, Clone, Default)]
pub struct DeliveryCursor {
    offset: usize,
    acknowledged: HashSet<u64>,
}

impl DeliveryCursor {
    /// Index of the first unacknowledged record
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether `sequence` has been acknowledged
    pub fn is_acknowledged(&self, sequence: u64) -> bool {
        self.acknowledged.contains(&sequence)
    }

    /// Number of acknowledged sequences
    pub fn acknowledged_count(&self) -> usize {
        self.acknowledged.len()
    }

    /// Oldest record not yet acknowledged
    fn pending<'a>(&mut self, records: &'a [ShotRecord]) -> Option<&'a ShotRecord> {
        self.advance(records);
        records[self.offset..]
            .iter()
            .find(|record| !self.acknowledged.contains(&record.sequence))
    }

    /// Mark a sequence acknowledged; returns false if it already was
    fn acknowledge(&mut self, sequence: u64, records: &[ShotRecord]) -> bool {
        let inserted = self.acknowledged.insert(sequence);
        self.advance(records);
        inserted
    }

    fn advance(&mut self, records: &[ShotRecord]) {
        while let Some(record) = records.get(self.offset) {
            if !self.acknowledged.contains(&record.sequence) {
                break;
            }
            self.offset += 1;
        }
    }
}

/// Event payload handed to consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotEvent {
    pub sequence: u64,
    pub player: String,
    pub description: String,
    pub team: String,
    pub result: String,
    pub color: String,
    /// Notable subtype (made dunk)
    pub highlight: bool,
    pub is_three_point: bool,
    pub x: i32,
    pub y: i32,
    /// Position inferred from the basket-side table
    pub inferred_position: bool,
    pub time_actual: String,
    pub score_home: String,
    pub score_away: String,
    pub period: u32,
    pub clock: String,
    pub home_team: String,
    pub away_team: String,
    pub on_court: RosterSnapshot,
    pub game_id: String,
}

impl ShotEvent {
    fn new(record: &ShotRecord, labels: &TeamLabels, game_id: &str) -> Self {
        let action = &record.action;
        let placement = &record.placement;

        Self {
            sequence: record.sequence,
            player: action.player.clone(),
            description: action.description.clone(),
            team: action.team.clone(),
            result: action.outcome.as_str().to_string(),
            color: placement.category.color().to_string(),
            highlight: placement.category.highlight,
            is_three_point: action.three_pointer,
            x: placement.x,
            y: placement.y,
            inferred_position: placement.inferred,
            time_actual: action.time_actual.clone(),
            score_home: action.score_home.clone(),
            score_away: action.score_away.clone(),
            period: action.period,
            clock: action.clock.clone(),
            home_team: labels.home.clone(),
            away_team: labels.away.clone(),
            on_court: record.roster.clone(),
            game_id: game_id.to_string(),
        }
    }
}

/// Result of a `pop` or `peek`
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Session was (re)started; clear local display state
    Reset,
    /// Next shot for this consumer
    Event(Box<ShotEvent>),
    /// Paused, or nothing pending
    NoContent,
}

impl Delivery {
    /// The event, if this delivery carries one
    pub fn event(&self) -> Option<&ShotEvent> {
        match self {
            Delivery::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// Pause and reset take precedence over pending events
fn gate(entry: &mut SessionEntry) -> Option<Delivery> {
    if entry.paused {
        return Some(Delivery::NoContent);
    }
    if std::mem::take(&mut entry.just_reset) {
        tracing::debug!(session = %entry.session_id, "Reset surfaced to consumer");
        return Some(Delivery::Reset);
    }
    None
}

/// Hand out and acknowledge the oldest unacknowledged shot
pub fn pop(entry: &mut SessionEntry, consumer: &ConsumerId) -> Delivery {
    if let Some(delivery) = gate(entry) {
        return delivery;
    }

    let cursor = entry.cursors.entry(consumer.clone()).or_default();
    let Some(record) = cursor.pending(&entry.records) else {
        return Delivery::NoContent;
    };
    cursor.acknowledge(record.sequence, &entry.records);
    entry.stats.deliveries += 1;

    tracing::debug!(
        session = %entry.session_id,
        consumer = %consumer,
        sequence = record.sequence,
        "Shot delivered"
    );

    Delivery::Event(Box::new(ShotEvent::new(
        record,
        &entry.labels,
        &entry.source_id,
    )))
}

/// Return the oldest unacknowledged shot without acknowledging it
pub fn peek(entry: &mut SessionEntry, consumer: &ConsumerId) -> Delivery {
    if let Some(delivery) = gate(entry) {
        return delivery;
    }

    let cursor = entry.cursors.entry(consumer.clone()).or_default();
    match cursor.pending(&entry.records) {
        Some(record) => Delivery::Event(Box::new(ShotEvent::new(
            record,
            &entry.labels,
            &entry.source_id,
        ))),
        None => Delivery::NoContent,
    }
}

/// Acknowledge a shot for a consumer.
///
/// Returns `Ok(false)` if it was already acknowledged. Sequence numbers
/// never assigned in this session are rejected.
pub fn acknowledge(
    entry: &mut SessionEntry,
    consumer: &ConsumerId,
    sequence: u64,
) -> Result<bool, RegistryError> {
    if entry.record(sequence).is_none() {
        return Err(RegistryError::UnknownSequence(sequence));
    }

    let cursor = entry.cursors.entry(consumer.clone()).or_default();
    let newly = cursor.acknowledge(sequence, &entry.records);
    if newly {
        entry.stats.deliveries += 1;
        tracing::debug!(
            session = %entry.session_id,
            consumer = %consumer,
            sequence = sequence,
            "Shot acknowledged"
        );
    }

    Ok(newly)
}
