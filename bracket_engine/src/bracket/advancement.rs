//! Match result processing over the bracket graph.
//!
//! [`MatchGraph`] is a scratch copy of a tournament's matches. Every operation
//! mutates the copy and reports which matches it touched; the caller persists
//! exactly those in one write, or drops the copy when the operation fails.

use super::errors::{BracketError, BracketResult};
use super::models::{Match, MatchId, MatchState, SlotRef, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Final result reported for a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub team1_score: i32,
    pub team2_score: i32,
    /// Overrides the score-derived winner (forfeits, admin decisions)
    pub declared_winner: Option<TeamId>,
}

impl MatchResult {
    pub fn new(team1_score: i32, team2_score: i32) -> Self {
        Self {
            team1_score,
            team2_score,
            declared_winner: None,
        }
    }

    pub fn with_winner(mut self, winner: TeamId) -> Self {
        self.declared_winner = Some(winner);
        self
    }
}

/// IDs of matches changed by an operation
pub type Touched = BTreeSet<MatchId>;

/// Work copy of a tournament's match graph
#[derive(Debug, Clone, Default)]
pub struct MatchGraph {
    matches: HashMap<MatchId, Match>,
}

impl MatchGraph {
    pub fn new(matches: impl IntoIterator<Item = Match>) -> Self {
        Self {
            matches: matches.into_iter().map(|m| (m.id, m)).collect(),
        }
    }

    pub fn get(&self, id: MatchId) -> BracketResult<&Match> {
        self.matches.get(&id).ok_or(BracketError::MatchNotFound(id))
    }

    fn get_mut(&mut self, id: MatchId) -> BracketResult<&mut Match> {
        self.matches
            .get_mut(&id)
            .ok_or(BracketError::MatchNotFound(id))
    }

    /// Clone out the touched matches for persisting
    pub fn collect(&self, touched: &Touched) -> Vec<Match> {
        touched
            .iter()
            .filter_map(|id| self.matches.get(id).cloned())
            .collect()
    }

    /// Complete a match and move its winner and loser along their edges.
    pub fn complete(&mut self, id: MatchId, result: &MatchResult) -> BracketResult<Touched> {
        let m = self.get_mut(id)?;
        if m.is_completed() {
            return Err(BracketError::MatchAlreadyCompleted(id));
        }
        let (Some(team1), Some(team2)) = (m.team1, m.team2) else {
            return Err(BracketError::MatchNotReady(id));
        };

        let winner = decide_winner(m, result)?;
        m.team1_score = result.team1_score;
        m.team2_score = result.team2_score;
        m.winner = winner;
        m.state = MatchState::Completed;
        let (next_winner, next_loser) = (m.next_winner_match, m.next_loser_match);

        let mut touched = Touched::from([id]);
        if let Some(winner) = winner {
            if let Some(next) = next_winner {
                self.advance(next, winner)?;
                touched.insert(next);
            }
            if let Some(next) = next_loser {
                let loser = if winner == team1 { team2 } else { team1 };
                self.advance(next, loser)?;
                touched.insert(next);
            }
        }

        Ok(touched)
    }

    /// Mark a match with both teams seated as live. Starting a live match is a no-op.
    pub fn start(&mut self, id: MatchId) -> BracketResult<Touched> {
        let m = self.get_mut(id)?;
        if m.is_completed() {
            return Err(BracketError::MatchAlreadyCompleted(id));
        }
        if m.team_count() < 2 {
            return Err(BracketError::MatchNotReady(id));
        }
        m.state = MatchState::Live;
        Ok(Touched::from([id]))
    }

    /// Empty a slot; a live match that loses a team drops back to pending.
    fn vacate(&mut self, at: SlotRef) -> BracketResult<Option<TeamId>> {
        let m = self.get_mut(at.match_id)?;
        let removed = m.team(at.slot);
        m.set_team(at.slot, None);
        if m.state == MatchState::Live {
            m.state = MatchState::Pending;
        }
        Ok(removed)
    }

    /// Put `team` into the first empty slot of `id` without overwriting anything.
    fn advance(&mut self, id: MatchId, team: TeamId) -> BracketResult<()> {
        let target = self.get_mut(id)?;
        if target.contains(team) {
            return Ok(());
        }
        let slot = target
            .first_empty_slot()
            .ok_or(BracketError::SlotOccupied(id))?;
        target.set_team(slot, Some(team));
        log::debug!("Team {} advanced into match {} ({:?})", team, id, slot);
        Ok(())
    }

    /// Reset a completed match and clear everything it advanced downstream.
    ///
    /// Downstream matches that were already decided are reset first, recursively.
    pub fn reset(&mut self, id: MatchId) -> BracketResult<Touched> {
        let m = self.get(id)?;
        if !m.is_completed() {
            return Err(BracketError::MatchNotCompleted(id));
        }
        if m.is_bye() {
            return Err(BracketError::ByeNotResettable(id));
        }

        let mut touched = Touched::new();
        self.reset_cascade(id, &mut touched)?;
        Ok(touched)
    }

    fn reset_cascade(&mut self, id: MatchId, touched: &mut Touched) -> BracketResult<()> {
        let m = self.get(id)?;
        let advanced = [
            m.next_winner_match.zip(m.winner),
            m.next_loser_match.zip(m.loser()),
        ];

        for (next, team) in advanced.into_iter().flatten() {
            self.withdraw(next, team, touched)?;
        }

        self.get_mut(id)?.reset();
        touched.insert(id);
        Ok(())
    }

    fn withdraw(&mut self, id: MatchId, team: TeamId, touched: &mut Touched) -> BracketResult<()> {
        let target = self.get(id)?;
        let Some(slot) = target.slot_of(team) else {
            return Ok(());
        };
        if target.is_completed() {
            log::warn!(
                "Cascading reset into completed match {} ({} round {})",
                id,
                target.phase,
                target.round
            );
            self.reset_cascade(id, touched)?;
        }

        self.vacate(SlotRef::new(id, slot))?;
        touched.insert(id);
        Ok(())
    }

    /// Swap the occupants of two slots of unfinished matches.
    pub fn swap_slots(&mut self, a: SlotRef, b: SlotRef) -> BracketResult<Touched> {
        let team_a = self.editable(a.match_id)?.team(a.slot);
        let team_b = self.editable(b.match_id)?.team(b.slot);

        self.get_mut(a.match_id)?.set_team(a.slot, team_b);
        self.get_mut(b.match_id)?.set_team(b.slot, team_a);
        Ok(Touched::from([a.match_id, b.match_id]))
    }

    /// Empty a slot of an unfinished match. Returns the removed team.
    pub fn remove_team(&mut self, at: SlotRef) -> BracketResult<Option<TeamId>> {
        self.editable(at.match_id)?;
        self.vacate(at)
    }

    /// Place `team` into an empty slot of an unfinished match.
    pub fn assign_team(&mut self, at: SlotRef, team: TeamId) -> BracketResult<()> {
        let m = self.editable(at.match_id)?;
        if m.team(at.slot).is_some() {
            return Err(BracketError::SlotOccupied(at.match_id));
        }
        if m.contains(team) {
            return Err(BracketError::DuplicateTeam {
                match_id: at.match_id,
                team_id: team,
            });
        }
        self.get_mut(at.match_id)?.set_team(at.slot, Some(team));
        Ok(())
    }

    fn editable(&self, id: MatchId) -> BracketResult<&Match> {
        let m = self.get(id)?;
        if m.is_completed() {
            return Err(BracketError::MatchAlreadyCompleted(id));
        }
        Ok(m)
    }
}

/// Winner of `m` under `result`: the declared team, else the higher score.
///
/// Equal scores are a draw (no winner) in standings-only phases and an error elsewhere.
pub fn decide_winner(m: &Match, result: &MatchResult) -> BracketResult<Option<TeamId>> {
    if let Some(declared) = result.declared_winner {
        if !m.contains(declared) {
            return Err(BracketError::InvalidWinner {
                match_id: m.id,
                team_id: declared,
            });
        }
        return Ok(Some(declared));
    }

    match result.team1_score.cmp(&result.team2_score) {
        std::cmp::Ordering::Greater => Ok(m.team1),
        std::cmp::Ordering::Less => Ok(m.team2),
        std::cmp::Ordering::Equal if m.phase.allows_draw() => Ok(None),
        std::cmp::Ordering::Equal => Err(BracketError::DrawNotAllowed(m.id)),
    }
}
