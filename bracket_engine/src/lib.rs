//! # Bracket Engine
//!
//! Builds tournament match graphs, advances teams through them as results come
//! in, and derives standings from completed matches.
//!
//! ## Formats
//!
//! - **Single elimination**: power-of-two bracket, byes auto-completed
//! - **Double elimination**: fixed 16-team template seeded from groups A to D
//! - **Group stage / round robin**: circle-method schedule per group
//! - **Swiss**: greedy pairing by standings, no rematches
//!
//! Every elimination match stores explicit `next_winner_match` and
//! `next_loser_match` edges, so advancement always follows the stored graph.
//!
//! ## Core Modules
//!
//! - [`bracket`]: builders, advancement, standings and the [`BracketManager`]
//! - [`db`]: repository traits with PostgreSQL and in-memory stores
//! - [`config`]: default series formats

pub mod bracket;
pub use bracket::{
    BracketError, BracketManager, BracketResult, Match, MatchFormat, MatchId, MatchPhase,
    MatchResult, MatchState, Slot, SlotRef, Standing, Team, TeamId, Tournament,
    TournamentFormat, TournamentId,
};

pub mod config;
pub use config::{ConfigError, EngineConfig};

/// Storage gateway for tournaments, teams and matches.
pub mod db;
