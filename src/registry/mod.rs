//! Session registry for ingestion and ordered delivery
//!
//! The registry owns one slot per session: the session's store behind its
//! own mutex, and the handle of the single poller feeding it. Consumers read
//! from the store through cursors; the poller only ever appends.
//!
//! # Architecture
//!
//! ```text
//!                         Arc<SessionRegistry>
//!                     ┌──────────────────────────┐
//!                     │ sessions: HashMap<Id,    │
//!                     │   SessionSlot {          │
//!                     │     store: Mutex<Entry>, │
//!                     │     poller: Handle,      │
//!                     │   }                      │
//!                     │ >                        │
//!                     └────────────┬─────────────┘
//!                                  │
//!         ┌────────────────────────┼────────────────────────┐
//!         │                        │                        │
//!         ▼                        ▼                        ▼
//!     [Poller]                [Consumer]               [Consumer]
//!   fetch snapshot            pop(session)         peek + acknowledge
//!         │                        │                        │
//!         └──► entry.ingest() ──► records[..] ◄── cursor per consumer
//! ```
//!
//! # Ordering
//!
//! Sequence numbers are assigned under the store lock in the order records
//! are first seen, starting at 1. A consumer's cursor never moves backwards,
//! so each consumer sees shots in strictly increasing sequence order.

pub mod config;
pub mod delivery;
pub mod entry;
pub mod error;
pub mod id;
pub mod store;

pub use config::RegistryConfig;
pub use delivery::{Delivery, DeliveryCursor, ShotEvent};
pub use entry::{IngestReport, SessionEntry, ShotRecord, TeamLabels};
pub use error::RegistryError;
pub use id::{ConsumerId, SessionId};
pub use store::{SessionInfo, SessionRegistry};
