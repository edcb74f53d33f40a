//! Snapshot ingestion
//!
//! Turns upstream records into cached shots: keying, classification,
//! display placement, on-court tracking, and the background poller that
//! drives all of it.

pub mod classify;
pub mod key;
pub mod poller;
pub mod roster;

pub use classify::{
    classify, format_clock, BasketSide, Category, Classified, CourtMapper, Direction, GridConfig,
    Half, IgnoreReason, Outcome, Placement, RosterChange, ScoringAction, ShotKind,
};
pub use key::IdempotencyKey;
pub use poller::{PollerContext, PollerHandle};
pub use roster::{OnCourtPlayer, RosterApply, RosterSnapshot, RosterTracker};
