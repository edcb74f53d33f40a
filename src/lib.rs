//! courtside: live shot-feed ingestion and ordered delivery
//!
//! Polls a live play-by-play feed for each tracked game, turns scoring
//! records into display-ready shot events, and hands them to consumers one at
//! a time in the order they were first seen. Every consumer has its own
//! cursor, so a display that reconnects picks up where it left off.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use courtside::feed::{FeedConfig, HttpFeed};
//! use courtside::registry::{Delivery, SessionRegistry};
//!
//! # async fn example() -> courtside::Result<()> {
//! let feed = HttpFeed::new(FeedConfig::default())?;
//! let registry = SessionRegistry::new(Arc::new(feed));
//!
//! registry.start("arena-board", "0022400061", None).await?;
//!
//! loop {
//!     match registry.pop("arena-board", "main-display").await? {
//!         Delivery::Reset => { /* clear the display */ }
//!         Delivery::Event(shot) => {
//!             println!("{} {} at ({}, {})", shot.player, shot.result, shot.x, shot.y);
//!         }
//!         Delivery::NoContent => tokio::time::sleep(std::time::Duration::from_secs(1)).await,
//!     }
//! }
//! # }
//! ```
//!
//! # Modules
//!
//! - [`feed`]: upstream documents and the [`feed::FeedSource`] seam
//! - [`ingest`]: keying, classification, court placement, rosters, poller
//! - [`registry`]: per-session stores, delivery cursors, lifecycle
//! - [`server`]: HTTP surface over the registry
//! - [`stats`]: per-session counters

pub mod error;
pub mod feed;
pub mod ingest;
pub mod registry;
pub mod server;
pub mod stats;

pub use error::{Error, Result};
pub use feed::{FeedConfig, FeedSource, HttpFeed, StaticFeed};
pub use registry::{Delivery, RegistryConfig, SessionRegistry, ShotEvent, TeamLabels};
pub use server::{HttpServer, ServerConfig};
