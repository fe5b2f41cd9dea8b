//! Standings derived from completed matches.
//!
//! Nothing here is stored: every call recomputes the table from the matches it is given.

use super::models::{Match, Team, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Points for a win
pub const WIN_POINTS: u32 = 3;

/// Points for a declared draw
pub const DRAW_POINTS: u32 = 1;

/// One row of a standings table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub team_id: TeamId,
    pub team_name: String,
    pub group_id: Option<String>,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
    pub score_for: i64,
    pub score_against: i64,
}

impl Standing {
    pub fn new(team_id: TeamId, team_name: String, group_id: Option<String>) -> Self {
        Self {
            team_id,
            team_name,
            group_id,
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            points: 0,
            score_for: 0,
            score_against: 0,
        }
    }

    /// Wins minus losses
    pub fn differential(&self) -> i64 {
        i64::from(self.wins) - i64::from(self.losses)
    }

    fn record(&mut self, own_score: i32, other_score: i32, outcome: Outcome) {
        self.played += 1;
        self.score_for += i64::from(own_score);
        self.score_against += i64::from(other_score);
        match outcome {
            Outcome::Win => {
                self.wins += 1;
                self.points += WIN_POINTS;
            }
            Outcome::Draw => {
                self.draws += 1;
                self.points += DRAW_POINTS;
            }
            Outcome::Loss => self.losses += 1,
        }
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Win,
    Draw,
    Loss,
}

/// Compute the standings of `teams` from the completed entries of `matches`.
///
/// Sorted by points, then win/loss differential, then wins. Remaining ties keep the
/// order of `teams`. Matches involving teams outside `teams` only count for the
/// listed side.
pub fn compute_standings(teams: &[Team], matches: &[Match]) -> Vec<Standing> {
    let mut table: Vec<Standing> = teams
        .iter()
        .map(|t| Standing::new(t.id, t.name.clone(), t.group_id.clone()))
        .collect();
    let index: HashMap<TeamId, usize> = table
        .iter()
        .enumerate()
        .map(|(i, s)| (s.team_id, i))
        .collect();

    for m in matches.iter().filter(|m| m.is_completed()) {
        let sides = [
            (m.team1, m.team1_score, m.team2_score),
            (m.team2, m.team2_score, m.team1_score),
        ];
        for (team, own, other) in sides {
            let Some(&i) = team.as_ref().and_then(|t| index.get(t)) else {
                continue;
            };
            let outcome = match m.winner {
                Some(w) if Some(w) == team => Outcome::Win,
                Some(_) => Outcome::Loss,
                None => Outcome::Draw,
            };
            table[i].record(own, other, outcome);
        }
    }

    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.differential().cmp(&a.differential()))
            .then_with(|| b.wins.cmp(&a.wins))
    });
    table
}
