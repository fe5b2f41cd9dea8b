//! Bracket data models: tournaments, teams, matches and their advancement edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tournament ID type
pub type TournamentId = i64;

/// Team ID type
pub type TeamId = i64;

/// Match ID type. Generated by the builders so edges exist before insertion.
pub type MatchId = Uuid;

/// Bracket section a match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    SingleElim,
    UpperBracket,
    LowerBracket,
    GrandFinals,
    GroupStage,
    Swiss,
    North,
    East,
    South,
    West,
}

impl MatchPhase {
    pub const ALL: [MatchPhase; 10] = [
        MatchPhase::SingleElim,
        MatchPhase::UpperBracket,
        MatchPhase::LowerBracket,
        MatchPhase::GrandFinals,
        MatchPhase::GroupStage,
        MatchPhase::Swiss,
        MatchPhase::North,
        MatchPhase::East,
        MatchPhase::South,
        MatchPhase::West,
    ];

    /// Phases replaced when a playoff bracket is regenerated
    pub const PLAYOFFS: [MatchPhase; 4] = [
        MatchPhase::SingleElim,
        MatchPhase::UpperBracket,
        MatchPhase::LowerBracket,
        MatchPhase::GrandFinals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::SingleElim => "single_elim",
            MatchPhase::UpperBracket => "upper_bracket",
            MatchPhase::LowerBracket => "lower_bracket",
            MatchPhase::GrandFinals => "grand_finals",
            MatchPhase::GroupStage => "group_stage",
            MatchPhase::Swiss => "swiss",
            MatchPhase::North => "north",
            MatchPhase::East => "east",
            MatchPhase::South => "south",
            MatchPhase::West => "west",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let phase = match value {
            "single_elim" => MatchPhase::SingleElim,
            "upper_bracket" => MatchPhase::UpperBracket,
            "lower_bracket" => MatchPhase::LowerBracket,
            "grand_finals" => MatchPhase::GrandFinals,
            "group_stage" => MatchPhase::GroupStage,
            "swiss" => MatchPhase::Swiss,
            "north" => MatchPhase::North,
            "east" => MatchPhase::East,
            "south" => MatchPhase::South,
            "west" => MatchPhase::West,
            _ => return None,
        };
        Some(phase)
    }

    /// Standings-only phases accept an explicit draw (equal scores, no winner).
    pub fn allows_draw(&self) -> bool {
        matches!(self, MatchPhase::GroupStage | MatchPhase::Swiss)
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Match lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    Pending,
    Live,
    Completed,
}

impl MatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchState::Pending => "pending",
            MatchState::Live => "live",
            MatchState::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(MatchState::Pending),
            "live" => Some(MatchState::Live),
            "completed" => Some(MatchState::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-of-N series descriptor. Informational to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchFormat {
    pub best_of: u8,
}

impl MatchFormat {
    pub const fn best_of(best_of: u8) -> Self {
        Self { best_of }
    }

    /// An even series length can end level.
    pub fn allows_draw(&self) -> bool {
        self.best_of % 2 == 0
    }

    /// Parse the stored `bo<N>` form
    pub fn parse(value: &str) -> Option<Self> {
        value
            .strip_prefix("bo")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| *n > 0)
            .map(Self::best_of)
    }
}

impl Default for MatchFormat {
    fn default() -> Self {
        Self::best_of(1)
    }
}

impl std::fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bo{}", self.best_of)
    }
}

/// Stage the tournament is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivePhase {
    GroupStage,
    Playoffs,
}

impl ActivePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivePhase::GroupStage => "group_stage",
            ActivePhase::Playoffs => "playoffs",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "group_stage" => Some(ActivePhase::GroupStage),
            "playoffs" => Some(ActivePhase::Playoffs),
            _ => None,
        }
    }
}

/// Overall competition format chosen for a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    SingleElimination,
    /// Group stage feeding the fixed 16-team double elimination playoff
    GroupsThenDoubleElimination,
    RoundRobin,
    Swiss,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::SingleElimination => "single_elimination",
            TournamentFormat::GroupsThenDoubleElimination => "groups_then_double_elimination",
            TournamentFormat::RoundRobin => "round_robin",
            TournamentFormat::Swiss => "swiss",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single_elimination" => Some(TournamentFormat::SingleElimination),
            "groups_then_double_elimination" => {
                Some(TournamentFormat::GroupsThenDoubleElimination)
            }
            "round_robin" => Some(TournamentFormat::RoundRobin),
            "swiss" => Some(TournamentFormat::Swiss),
            _ => None,
        }
    }
}

/// Tournament record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// Target number of team slots
    pub slot_count: usize,
    pub format: TournamentFormat,
    pub active_phase: Option<ActivePhase>,
    pub created_at: DateTime<Utc>,
}

/// Team record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub tournament_id: Option<TournamentId>,
    pub name: String,
    /// Group label (`A`..`H`) assigned by group stage generation
    pub group_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One of the two team slots of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    One,
    Two,
}

/// Address of a single slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    pub match_id: MatchId,
    pub slot: Slot,
}

impl SlotRef {
    pub fn new(match_id: MatchId, slot: Slot) -> Self {
        Self { match_id, slot }
    }
}

/// Match record: a node of the bracket graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub team1: Option<TeamId>,
    pub team2: Option<TeamId>,
    pub winner: Option<TeamId>,
    pub team1_score: i32,
    pub team2_score: i32,
    /// Round number, 1-indexed within the bracket section
    pub round: u32,
    /// Index within the round
    pub position: u32,
    pub phase: MatchPhase,
    pub group_id: Option<String>,
    pub state: MatchState,
    pub next_winner_match: Option<MatchId>,
    pub next_loser_match: Option<MatchId>,
    pub match_format: MatchFormat,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Create an empty pending match with a fresh ID
    pub fn new(
        tournament_id: TournamentId,
        phase: MatchPhase,
        round: u32,
        position: u32,
        match_format: MatchFormat,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            team1: None,
            team2: None,
            winner: None,
            team1_score: 0,
            team2_score: 0,
            round,
            position,
            phase,
            group_id: None,
            state: MatchState::Pending,
            next_winner_match: None,
            next_loser_match: None,
            match_format,
            created_at: Utc::now(),
        }
    }

    pub fn team(&self, slot: Slot) -> Option<TeamId> {
        match slot {
            Slot::One => self.team1,
            Slot::Two => self.team2,
        }
    }

    pub fn set_team(&mut self, slot: Slot, team: Option<TeamId>) {
        match slot {
            Slot::One => self.team1 = team,
            Slot::Two => self.team2 = team,
        }
    }

    pub fn slot_of(&self, team: TeamId) -> Option<Slot> {
        if self.team1 == Some(team) {
            Some(Slot::One)
        } else if self.team2 == Some(team) {
            Some(Slot::Two)
        } else {
            None
        }
    }

    pub fn contains(&self, team: TeamId) -> bool {
        self.slot_of(team).is_some()
    }

    /// Slot 1 if empty, else slot 2 if empty
    pub fn first_empty_slot(&self) -> Option<Slot> {
        if self.team1.is_none() {
            Some(Slot::One)
        } else if self.team2.is_none() {
            Some(Slot::Two)
        } else {
            None
        }
    }

    pub fn team_count(&self) -> usize {
        usize::from(self.team1.is_some()) + usize::from(self.team2.is_some())
    }

    pub fn is_completed(&self) -> bool {
        self.state == MatchState::Completed
    }

    /// Completed with a single team present
    pub fn is_bye(&self) -> bool {
        self.is_completed() && self.team_count() == 1
    }

    /// Completed between two teams without a winner
    pub fn is_draw(&self) -> bool {
        self.is_completed() && self.winner.is_none() && self.team_count() == 2
    }

    /// The non-winning team of a decided two-team match
    pub fn loser(&self) -> Option<TeamId> {
        let winner = self.winner?;
        match (self.team1, self.team2) {
            (Some(t1), Some(t2)) if t1 == winner => Some(t2),
            (Some(t1), Some(t2)) if t2 == winner => Some(t1),
            _ => None,
        }
    }

    /// Award the match to its only present team, 1-0.
    ///
    /// Returns the advancing team, or `None` if the match does not hold exactly one team.
    pub fn complete_as_bye(&mut self) -> Option<TeamId> {
        let (winner, slot) = match (self.team1, self.team2) {
            (Some(t), None) => (t, Slot::One),
            (None, Some(t)) => (t, Slot::Two),
            _ => return None,
        };

        let (own, other) = match slot {
            Slot::One => (&mut self.team1_score, &mut self.team2_score),
            Slot::Two => (&mut self.team2_score, &mut self.team1_score),
        };
        *own = 1;
        *other = 0;
        self.winner = Some(winner);
        self.state = MatchState::Completed;
        Some(winner)
    }

    /// Back to pending with zeroed scores. Slots are left untouched.
    pub fn reset(&mut self) {
        self.team1_score = 0;
        self.team2_score = 0;
        self.winner = None;
        self.state = MatchState::Pending;
    }
}
