//! Bracket module: construction, advancement and standings for team tournaments.
//!
//! This module provides:
//! - Single elimination brackets with byes resolved before storage
//! - A fixed 16-team double elimination template seeded from group standings
//! - Group stages scheduled with the circle method
//! - Swiss rounds paired greedily without rematches
//! - Result reporting that follows explicit winner/loser edges
//!
//! ## Example
//!
//! ```no_run
//! use bracket_engine::bracket::{BracketManager, MatchResult, TournamentFormat};
//! use bracket_engine::config::EngineConfig;
//! use bracket_engine::db::{Database, DatabaseConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::development()).await?;
//!     let manager = BracketManager::new(Arc::new(db.store()), EngineConfig::default());
//!
//!     let cup = manager
//!         .create_tournament("Spring Cup", 8, TournamentFormat::SingleElimination)
//!         .await?;
//!     for name in ["Alpha", "Bravo", "Charlie", "Delta", "Echo"] {
//!         manager.register_team(cup.id, name).await?;
//!     }
//!
//!     let bracket = manager.generate_single_elimination(cup.id, None).await?;
//!     let opener = bracket.iter().find(|m| m.team_count() == 2).ok_or("no playable match")?;
//!     manager.report_result(opener.id, MatchResult::new(2, 1)).await?;
//!     Ok(())
//! }
//! ```

pub mod advancement;
pub mod double_elim;
pub mod errors;
pub mod manager;
pub mod models;
pub mod round_robin;
pub mod single_elim;
pub mod standings;
pub mod swiss;

pub use advancement::{MatchGraph, MatchResult, Touched};
pub use errors::{BracketError, BracketResult};
pub use manager::BracketManager;
pub use models::{
    ActivePhase, Match, MatchFormat, MatchId, MatchPhase, MatchState, Slot, SlotRef, Team,
    TeamId, Tournament, TournamentFormat, TournamentId,
};
pub use standings::Standing;
pub use swiss::{GreedyPairing, Pairing, PairingStrategy, PlayedPairs};
