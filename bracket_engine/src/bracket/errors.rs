//! Bracket engine error types.

use super::models::{MatchId, TeamId, TournamentId};
use thiserror::Error;

/// Bracket engine errors
#[derive(Debug, Error)]
pub enum BracketError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Team not found: {0}")]
    TeamNotFound(TeamId),

    #[error("Insufficient teams: need {needed}, have {current}")]
    InsufficientTeams { needed: usize, current: usize },

    #[error("Group {group} has {current} ranked teams, need at least {needed}")]
    InsufficientGroupSize {
        group: String,
        needed: usize,
        current: usize,
    },

    #[error(
        "Invalid bracket size {size} for {teams} teams: must be a power of two and at least the team count"
    )]
    InvalidBracketSize { size: usize, teams: usize },

    #[error("Invalid group count {0}: must be between 1 and 8")]
    InvalidGroupCount(usize),

    #[error("Tournament is full: capacity {capacity}")]
    CapacityExceeded { capacity: usize },

    #[error("Match {0} cannot end in a draw")]
    DrawNotAllowed(MatchId),

    #[error("Swiss round {round} still has unfinished matches")]
    RoundIncomplete { round: u32 },

    #[error("Slot already occupied in match {0}")]
    SlotOccupied(MatchId),

    #[error("Team {team_id} is already placed in match {match_id}")]
    DuplicateTeam { match_id: MatchId, team_id: TeamId },

    #[error("Match {0} is already completed")]
    MatchAlreadyCompleted(MatchId),

    #[error("Match {0} is not completed")]
    MatchNotCompleted(MatchId),

    #[error("Match {0} does not have both teams yet")]
    MatchNotReady(MatchId),

    #[error("Team {team_id} is not playing in match {match_id}")]
    InvalidWinner { match_id: MatchId, team_id: TeamId },

    #[error("Match {0} is a bye and cannot be reset")]
    ByeNotResettable(MatchId),

    /// Stored row could not be mapped back to a model
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

impl BracketError {
    /// Get a client-safe error message
    ///
    /// Database and record errors are sanitized so storage details never reach callers.
    pub fn client_message(&self) -> String {
        match self {
            BracketError::Database(_) | BracketError::InvalidRecord(_) => {
                "Internal server error".to_string()
            }
            BracketError::Serialization(_) => "Invalid data".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
