//! Entity kinds and their storage sub-paths

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of fetchable record.
///
/// Each kind has its own id space and its own directory inside a partition,
/// so a player id and a game id with the same digits never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Roster,
    GameLog,
    ShotChart,
    PlayByPlay,
    BoxScore,
    PeriodBoxScore,
}

impl EntityKind {
    /// All kinds, in pipeline order.
    pub const ALL: [EntityKind; 6] = [
        Self::Roster,
        Self::GameLog,
        Self::ShotChart,
        Self::PlayByPlay,
        Self::BoxScore,
        Self::PeriodBoxScore,
    ];

    /// Directory name under `{root}/{partition}/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Roster => "roster",
            Self::GameLog => "player_game_logs",
            Self::ShotChart => "player_shot_chart_details",
            Self::PlayByPlay => "game_play_by_play",
            Self::BoxScore => "game_advanced_boxscore",
            Self::PeriodBoxScore => "game_advanced_boxscore_by_period",
        }
    }

    /// Short human label used in logs and progress lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Roster => "roster",
            Self::GameLog => "game log",
            Self::ShotChart => "shot chart",
            Self::PlayByPlay => "play by play",
            Self::BoxScore => "box score",
            Self::PeriodBoxScore => "period box score",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
