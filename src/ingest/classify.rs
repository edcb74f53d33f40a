//! Record classification and display transform
//!
//! Every upstream record is classified exactly one way:
//!
//! - **Scoring**: a made or missed shot with a timestamp, an actor and a team,
//!   that is either a positioned field goal, a dunk, or a free throw
//! - **Roster change**: a substitution with an actor, a team and a direction
//! - **Ignored**: everything else, including records missing a required field
//!
//! Scoring records are then placed on the display grid by [`CourtMapper`].
//! Positioned shots are scaled linearly. Positionless ones (free throws, the
//! odd dunk without coordinates) are drawn at the basket the team is
//! currently attacking, which the mapper learns from made positioned shots.

use std::collections::HashMap;

use serde::Serialize;

use crate::feed::RawAction;

use super::key::IdempotencyKey;

/// Shot outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Made,
    Missed,
}

impl Outcome {
    /// Parse the upstream `shotResult` value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("made") => Some(Outcome::Made),
            v if v.eq_ignore_ascii_case("missed") => Some(Outcome::Missed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Made => "Made",
            Outcome::Missed => "Missed",
        }
    }
}

/// Kind of scoring action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotKind {
    /// Two or three point attempt with court position
    FieldGoal,
    /// Made dunk, with or without position
    Dunk,
    /// Free throw (never positioned)
    FreeThrow,
}

/// Substitution direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Enter,
    Leave,
}

/// Why a record was not ingested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not a shot attempt or substitution
    NotScoring,
    MissingTimestamp,
    MissingActor,
    MissingTeam,
    /// Substitution without a recognisable in/out marker
    UnresolvedDirection,
    /// Fields carried the wrong JSON types
    Malformed,
}

/// A scoring record, validated
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringAction {
    pub key: IdempotencyKey,
    pub actor_id: u64,
    pub player: String,
    pub team: String,
    pub outcome: Outcome,
    pub kind: ShotKind,
    pub three_pointer: bool,
    /// Raw upstream position (percent of court)
    pub position: Option<(f64, f64)>,
    pub time_actual: String,
    pub period: u32,
    /// Game clock as `MM:SS`
    pub clock: String,
    pub description: String,
    pub score_home: String,
    pub score_away: String,
}

/// A substitution record, validated
#[derive(Debug, Clone, PartialEq)]
pub struct RosterChange {
    pub key: IdempotencyKey,
    pub actor_id: u64,
    pub actor_label: Option<String>,
    pub team: String,
    pub direction: Direction,
    pub period: u32,
}

/// Classification of one upstream record
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Scoring(ScoringAction),
    RosterChange(RosterChange),
    Ignored(IgnoreReason),
}

/// Classify a single upstream record
pub fn classify(action: &RawAction) -> Classified {
    if action.malformed {
        Classified::Ignored(IgnoreReason::Malformed)
    } else if action.action_type().eq_ignore_ascii_case("substitution") {
        classify_substitution(action)
    } else {
        classify_scoring(action)
    }
}

fn classify_substitution(action: &RawAction) -> Classified {
    let Some(actor_id) = action.actor_id() else {
        return Classified::Ignored(IgnoreReason::MissingActor);
    };
    let Some(team) = action.team() else {
        return Classified::Ignored(IgnoreReason::MissingTeam);
    };
    let direction = match action.sub_type().trim().to_ascii_lowercase().as_str() {
        "in" => Direction::Enter,
        "out" => Direction::Leave,
        _ => return Classified::Ignored(IgnoreReason::UnresolvedDirection),
    };
    let Some(key) = IdempotencyKey::derive(action) else {
        return Classified::Ignored(IgnoreReason::MissingTimestamp);
    };

    Classified::RosterChange(RosterChange {
        key,
        actor_id,
        actor_label: action.actor_label().map(str::to_string),
        team,
        direction,
        period: action.period.unwrap_or(1),
    })
}

fn classify_scoring(action: &RawAction) -> Classified {
    let Some(outcome) = action.shot_result.as_deref().and_then(Outcome::parse) else {
        return Classified::Ignored(IgnoreReason::NotScoring);
    };

    let action_type = action.action_type().trim().to_ascii_lowercase();
    let position = action.position();
    let is_dunk = outcome == Outcome::Made && action.sub_type().trim().eq_ignore_ascii_case("dunk");
    let kind = if action_type == "freethrow" {
        ShotKind::FreeThrow
    } else if is_dunk {
        ShotKind::Dunk
    } else if matches!(action_type.as_str(), "2pt" | "3pt") && position.is_some() {
        ShotKind::FieldGoal
    } else {
        return Classified::Ignored(IgnoreReason::NotScoring);
    };

    let Some(time_actual) = action.timestamp() else {
        return Classified::Ignored(IgnoreReason::MissingTimestamp);
    };
    let Some(actor_id) = action.actor_id() else {
        return Classified::Ignored(IgnoreReason::MissingActor);
    };
    let Some(team) = action.team() else {
        return Classified::Ignored(IgnoreReason::MissingTeam);
    };
    let Some(key) = IdempotencyKey::derive(action) else {
        return Classified::Ignored(IgnoreReason::MissingTimestamp);
    };

    Classified::Scoring(ScoringAction {
        key,
        actor_id,
        player: action
            .actor_label()
            .map(str::to_string)
            .unwrap_or_else(|| actor_id.to_string()),
        team,
        outcome,
        kind,
        three_pointer: action_type == "3pt",
        position: if kind == ShotKind::FreeThrow { None } else { position },
        time_actual: time_actual.trim().to_string(),
        period: action.period.unwrap_or(1),
        clock: action.clock.as_deref().map(format_clock).unwrap_or_default(),
        description: action.description.clone().unwrap_or_default(),
        score_home: action.score_home.clone().unwrap_or_else(|| "N/A".into()),
        score_away: action.score_away.clone().unwrap_or_else(|| "N/A".into()),
    })
}

/// Render an ISO-8601 game clock (`PT05M12.00S`) as `MM:SS`.
///
/// Unparseable input renders as `00:00`; empty input as an empty string.
pub fn format_clock(iso: &str) -> String {
    let iso = iso.trim();
    if iso.is_empty() {
        return String::new();
    }

    let parsed = iso
        .strip_prefix("PT")
        .and_then(|rest| rest.split_once('M'))
        .and_then(|(minutes, rest)| {
            let seconds = rest.strip_suffix('S')?;
            Some((minutes.parse::<u32>().ok()?, seconds.parse::<f64>().ok()?))
        });

    match parsed {
        Some((minutes, seconds)) if seconds >= 0.0 => {
            format!("{:02}:{:02}", minutes, seconds.trunc() as u32)
        }
        _ => "00:00".to_string(),
    }
}

/// Display grid geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Largest x coordinate (court length)
    pub width: u32,
    /// Largest y coordinate (court width)
    pub height: u32,
    /// Grid position of the left basket
    pub left_basket: (i32, i32),
    /// Grid position of the right basket
    pub right_basket: (i32, i32),
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 47,
            height: 31,
            left_basket: (10, 15),
            right_basket: (38, 15),
        }
    }
}

impl GridConfig {
    /// Scale a raw position (percent of court) onto the grid.
    ///
    /// The y axis is flipped: upstream y grows towards the top of the
    /// display, grid rows grow downwards.
    pub fn scale(&self, raw_x: f64, raw_y: f64) -> (i32, i32) {
        let w = self.width as f64;
        let h = self.height as f64;
        let x = (raw_x / 100.0 * w).round().clamp(0.0, w);
        let y = h - (raw_y / 100.0 * h).round().clamp(0.0, h);
        (x as i32, y as i32)
    }

    pub fn basket(&self, side: BasketSide) -> (i32, i32) {
        match side {
            BasketSide::Left => self.left_basket,
            BasketSide::Right => self.right_basket,
        }
    }
}

/// Which basket a team is attacking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasketSide {
    Left,
    Right,
}

impl BasketSide {
    pub fn flip(self) -> Self {
        match self {
            BasketSide::Left => BasketSide::Right,
            BasketSide::Right => BasketSide::Left,
        }
    }

    /// Side of the court a raw x coordinate falls in
    fn of_raw_x(raw_x: f64) -> Self {
        if raw_x < 50.0 {
            BasketSide::Left
        } else {
            BasketSide::Right
        }
    }

    /// Side assumed before any shot has been observed for a team
    fn fallback(is_home: bool, half: Half) -> Self {
        match (is_home, half) {
            (true, Half::First) | (false, Half::Second) => BasketSide::Left,
            (false, Half::First) | (true, Half::Second) => BasketSide::Right,
        }
    }
}

/// Game half; teams switch baskets between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    First,
    Second,
}

impl Half {
    /// Periods 1-2 are the first half, 3 and later (overtime included) the second
    pub fn of_period(period: u32) -> Self {
        if period <= 2 {
            Half::First
        } else {
            Half::Second
        }
    }
}

/// Success/failure category with an optional highlight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub outcome: Outcome,
    /// Notable subtype (made dunk); does not change the color
    pub highlight: bool,
}

impl Category {
    pub fn color(&self) -> &'static str {
        match self.outcome {
            Outcome::Made => "green",
            Outcome::Missed => "red",
        }
    }
}

/// Display position and category of a scoring action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub category: Category,
    /// Position came from the basket-side table rather than the record
    pub inferred: bool,
}

/// Maps scoring actions onto the display grid, one per session
#[derive(Debug, Clone)]
pub struct CourtMapper {
    grid: GridConfig,
    /// Team label -> (side, half it was observed in)
    sides: HashMap<String, (BasketSide, Half)>,
}

impl CourtMapper {
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            sides: HashMap::new(),
        }
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// Basket `team` attacks in `half`, if one has been observed
    pub fn observed_side(&self, team: &str, half: Half) -> Option<BasketSide> {
        self.sides.get(team).map(|&(side, seen_in)| {
            if seen_in == half {
                side
            } else {
                side.flip()
            }
        })
    }

    /// Place a scoring action, learning basket sides from made positioned shots
    pub fn place(&mut self, shot: &ScoringAction, home_label: &str) -> Placement {
        let half = Half::of_period(shot.period);
        let category = Category {
            outcome: shot.outcome,
            highlight: shot.kind == ShotKind::Dunk && shot.outcome == Outcome::Made,
        };

        if let Some((raw_x, raw_y)) = shot.position {
            if shot.outcome == Outcome::Made {
                let side = BasketSide::of_raw_x(raw_x);
                self.sides.insert(shot.team.clone(), (side, half));
            }
            let (x, y) = self.grid.scale(raw_x, raw_y);
            return Placement {
                x,
                y,
                category,
                inferred: false,
            };
        }

        let side = self
            .observed_side(&shot.team, half)
            .unwrap_or_else(|| BasketSide::fallback(shot.team == home_label, half));
        let (x, y) = self.grid.basket(side);

        Placement {
            x,
            y,
            category,
            inferred: true,
        }
    }
}
