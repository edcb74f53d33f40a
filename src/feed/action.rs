//! Upstream wire types
//!
//! The play-by-play endpoint returns the whole game to date on every call.
//! Every field is optional on the wire; missing fields are resolved later by
//! the classifier rather than rejected while decoding. A record whose fields
//! carry the wrong JSON types is kept as a malformed placeholder so the rest
//! of the snapshot still decodes.

use serde::{Deserialize, Deserializer};

/// Play-by-play document (`{"game": {"gameId": ..., "actions": [...]}}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayByPlay {
    #[serde(default)]
    pub game: PlayByPlayGame,
}

/// Game section of a play-by-play document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayByPlayGame {
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_actions")]
    pub actions: Vec<RawAction>,
}

/// One upstream play-by-play record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAction {
    /// Upstream ordinal, informational only
    pub action_number: Option<u64>,
    /// Game clock, ISO-8601 duration (`PT11M32.00S`)
    pub clock: Option<String>,
    /// Wall-clock timestamp of the action
    pub time_actual: Option<String>,
    pub period: Option<u32>,
    pub team_tricode: Option<String>,
    /// Actor id. The feed uses `0` for team-level actions.
    pub person_id: Option<u64>,
    pub player_name: Option<String>,
    /// Abbreviated player name (`S. Curry`)
    #[serde(rename = "playerNameI")]
    pub player_name_i: Option<String>,
    /// Court position, percent of court length
    pub x: Option<f64>,
    /// Court position, percent of court width
    pub y: Option<f64>,
    /// `Made` / `Missed` for shot attempts
    pub shot_result: Option<String>,
    /// Discriminator: `2pt`, `3pt`, `freethrow`, `substitution`, ...
    pub action_type: Option<String>,
    pub sub_type: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub score_home: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub score_away: Option<String>,
    /// Set when the record could not be decoded; such records are ignored
    #[serde(skip)]
    pub malformed: bool,
}

impl RawAction {
    /// Decode one record, falling back to a malformed placeholder
    pub fn from_value(value: serde_json::Value) -> Self {
        let action_number = value.get("actionNumber").and_then(serde_json::Value::as_u64);
        match serde_json::from_value::<RawAction>(value) {
            Ok(action) => action,
            Err(e) => {
                tracing::debug!(action_number = ?action_number, error = %e, "Malformed record");
                Self {
                    action_number,
                    malformed: true,
                    ..Self::default()
                }
            }
        }
    }

    /// Actor id, treating the feed's team-level `0` as absent
    pub fn actor_id(&self) -> Option<u64> {
        self.person_id.filter(|id| *id != 0)
    }

    /// Display name for the actor, preferring the abbreviated form
    pub fn actor_label(&self) -> Option<&str> {
        self.player_name_i
            .as_deref()
            .or(self.player_name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Team label, trimmed and upper-cased
    pub fn team(&self) -> Option<String> {
        self.team_tricode
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_uppercase)
    }

    /// Non-empty upstream timestamp
    pub fn timestamp(&self) -> Option<&str> {
        self.time_actual.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Court position if both coordinates are present
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }

    pub fn action_type(&self) -> &str {
        self.action_type.as_deref().unwrap_or("")
    }

    pub fn sub_type(&self) -> &str {
        self.sub_type.as_deref().unwrap_or("")
    }
}

/// Box score document, used once per session to seed starters and labels
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Boxscore {
    #[serde(default)]
    pub game: BoxscoreGame,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxscoreGame {
    pub home_team: BoxscoreTeam,
    pub away_team: BoxscoreTeam,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxscoreTeam {
    pub team_tricode: Option<String>,
    pub players: Vec<BoxscorePlayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxscorePlayer {
    pub person_id: u64,
    pub name: Option<String>,
    #[serde(rename = "nameI")]
    pub name_i: Option<String>,
    /// `"1"` for starters
    pub starter: Option<String>,
}

impl BoxscorePlayer {
    pub fn is_starter(&self) -> bool {
        self.starter.as_deref().map(str::trim) == Some("1")
    }
}

/// Starting five and label for one team
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamLineup {
    /// Team label (tricode)
    pub label: Option<String>,
    /// Starter ids with display names
    pub starters: Vec<(u64, Option<String>)>,
}

/// Result of the one-time roster lookup for a game
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartingLineups {
    pub home: TeamLineup,
    pub away: TeamLineup,
}

impl From<Boxscore> for StartingLineups {
    fn from(doc: Boxscore) -> Self {
        fn lineup(team: BoxscoreTeam) -> TeamLineup {
            let label = team
                .team_tricode
                .map(|t| t.trim().to_ascii_uppercase())
                .filter(|t| !t.is_empty());
            let starters = team
                .players
                .into_iter()
                .filter(|p| p.is_starter() && p.person_id != 0)
                .map(|p| (p.person_id, p.name_i.or(p.name)))
                .collect();
            TeamLineup { label, starters }
        }

        Self {
            home: lineup(doc.game.home_team),
            away: lineup(doc.game.away_team),
        }
    }
}

fn lenient_actions<'de, D>(deserializer: D) -> Result<Vec<RawAction>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<serde_json::Value>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(RawAction::from_value)
        .collect())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Score>::deserialize(deserializer)? {
        Some(Score::Text(s)) => Some(s),
        Some(Score::Int(n)) => Some(n.to_string()),
        Some(Score::Float(n)) => Some(n.to_string()),
        None => None,
    })
}
