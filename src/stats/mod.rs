//! Statistics for feed sessions

pub mod metrics;

pub use metrics::SessionStats;
