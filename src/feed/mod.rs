//! Upstream feed access
//!
//! Decoding of the play-by-play and box score documents, and the
//! [`FeedSource`] trait the pollers fetch snapshots through.

pub mod action;
pub mod config;
pub mod error;
pub mod source;

pub use action::{RawAction, StartingLineups, TeamLineup};
pub use config::FeedConfig;
pub use error::FeedError;
pub use source::{FeedSource, HttpFeed, StaticFeed};
