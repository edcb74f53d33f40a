//! Per-session ingestion and delivery statistics

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

/// Session-level statistics
///
/// Counters only grow for the lifetime of a session; a restart begins a
/// fresh set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Completed polls (successful or not)
    pub polls: u64,
    /// Polls whose fetch failed or timed out
    pub fetch_failures: u64,
    /// Most recent fetch error message
    pub last_fetch_error: Option<String>,
    /// Upstream records examined across all polls
    pub records_seen: u64,
    /// Scoring records added to the cache
    pub shots_ingested: u64,
    /// Scoring records skipped because they were already cached
    pub duplicates_skipped: u64,
    /// Records classified as ignored
    pub records_ignored: u64,
    /// Substitutions applied to the roster
    pub roster_changes: u64,
    /// Substitutions that left the roster inconsistent
    pub roster_anomalies: u64,
    /// Events acknowledged by consumers, via `pop` or `acknowledge`
    pub deliveries: u64,
    /// Time since the session started
    #[serde(with = "duration_secs")]
    pub uptime: Duration,
    /// Latest substitutions, oldest first
    pub recent_substitutions: VecDeque<String>,
}

impl SessionStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed poll
    pub fn record_fetch_failure(&mut self, error: impl ToString) {
        self.polls += 1;
        self.fetch_failures += 1;
        self.last_fetch_error = Some(error.to_string());
    }

    /// Append to the substitution log, keeping at most `limit` entries
    pub fn log_substitution(&mut self, entry: String, limit: usize) {
        self.recent_substitutions.push_back(entry);
        while self.recent_substitutions.len() > limit {
            self.recent_substitutions.pop_front();
        }
    }

    /// Share of polls that failed, 0.0 when nothing was polled yet
    pub fn failure_rate(&self) -> f64 {
        if self.polls > 0 {
            self.fetch_failures as f64 / self.polls as f64
        } else {
            0.0
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_stats_new() {
        let stats = SessionStats::new();
        assert_eq!(stats.polls, 0);
        assert_eq!(stats.fetch_failures, 0);
        assert_eq!(stats.shots_ingested, 0);
        assert_eq!(stats.deliveries, 0);
        assert!(stats.last_fetch_error.is_none());
        assert!(stats.recent_substitutions.is_empty());
    }

    #[test]
    fn test_record_fetch_failure() {
        let mut stats = SessionStats::new();
        stats.polls = 3;

        stats.record_fetch_failure("connection reset");

        assert_eq!(stats.polls, 4);
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.last_fetch_error.as_deref(), Some("connection reset"));
        assert_eq!(stats.failure_rate(), 0.25);
    }

    #[test]
    fn test_failure_rate_zero_polls() {
        let stats = SessionStats::new();

        assert_eq!(stats.failure_rate(), 0.0);
    }

    #[test]
    fn test_substitution_log_is_bounded() {
        let mut stats = SessionStats::new();

        for i in 0..8 {
            stats.log_substitution(format!("SUB {}", i), 5);
        }

        assert_eq!(stats.recent_substitutions.len(), 5);
        assert_eq!(stats.recent_substitutions.front().unwrap(), "SUB 3");
        assert_eq!(stats.recent_substitutions.back().unwrap(), "SUB 7");
    }

    #[test]
    fn test_serialize_camel_case() {
        let mut stats = SessionStats::new();
        stats.uptime = Duration::from_millis(1500);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["fetchFailures"], 0);
        assert_eq!(json["uptime"], 1.5);
        assert!(json["recentSubstitutions"].as_array().unwrap().is_empty());
    }
}
