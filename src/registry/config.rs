//! Registry configuration

use std::time::Duration;

use crate::ingest::GridConfig;

/// Session registry options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Interval between upstream fetches for each session
    pub poll_interval: Duration,

    /// Upper bound on a single fetch, on top of any transport timeout
    pub fetch_timeout: Duration,

    /// Upper bound on the one-time starter lookup at session start
    pub lookup_timeout: Duration,

    /// Expected players on court per team (reported, not enforced)
    pub roster_capacity: usize,

    /// Substitutions kept in each session's diagnostic log
    pub roster_log_len: usize,

    /// Display grid geometry
    pub grid: GridConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(10),
            lookup_timeout: Duration::from_secs(10),
            roster_capacity: 5,
            roster_log_len: 5,
            grid: GridConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Set the poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the starter lookup timeout
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set the expected roster size
    pub fn roster_capacity(mut self, capacity: usize) -> Self {
        self.roster_capacity = capacity;
        self
    }

    /// Set the substitution log length
    pub fn roster_log_len(mut self, len: usize) -> Self {
        self.roster_log_len = len;
        self
    }

    /// Set the display grid
    pub fn grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }
}
