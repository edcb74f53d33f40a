//! Idempotency keys for upstream records
//!
//! A key is the upstream timestamp, actor id, outcome and period joined with
//! `_`. The same record fetched in any later snapshot yields the same key.

use std::fmt;

use crate::feed::RawAction;

/// Stable identity of an upstream record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Build a key from its parts
    pub fn new(timestamp: &str, actor_id: u64, outcome: &str, period: u32) -> Self {
        Self(format!("{}_{}_{}_{}", timestamp.trim(), actor_id, outcome, period))
    }

    /// Derive the key for a record.
    ///
    /// The outcome is the shot result, or the substitution direction for
    /// roster changes. Returns `None` when the timestamp or the actor is
    /// missing; such records are never keyed.
    pub fn derive(action: &RawAction) -> Option<Self> {
        let timestamp = action.timestamp()?;
        let actor = action.actor_id()?;
        let outcome = match action.shot_result.as_deref() {
            Some(result) if !result.is_empty() => result.to_string(),
            _ => action.sub_type().to_ascii_lowercase(),
        };

        Some(Self::new(timestamp, actor, &outcome, action.period.unwrap_or(1)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
