//! Swiss round pairing.
//!
//! Pairing sits behind [`PairingStrategy`] so another matcher can replace the greedy
//! default without touching round generation.

use super::models::{Match, MatchFormat, MatchPhase, TeamId, TournamentId};
use std::collections::HashSet;

/// One pairing of a round. `team2 == None` is a bye.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub team1: TeamId,
    pub team2: Option<TeamId>,
}

impl Pairing {
    pub fn new(team1: TeamId, team2: TeamId) -> Self {
        Self {
            team1,
            team2: Some(team2),
        }
    }

    pub fn bye(team: TeamId) -> Self {
        Self {
            team1: team,
            team2: None,
        }
    }
}

/// Every pair of teams that already met, recorded in both directions
#[derive(Debug, Clone, Default)]
pub struct PlayedPairs {
    pairs: HashSet<(TeamId, TeamId)>,
}

impl PlayedPairs {
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a Match>) -> Self {
        let mut played = Self::default();
        for m in matches {
            if let (Some(a), Some(b)) = (m.team1, m.team2) {
                played.record(a, b);
            }
        }
        played
    }

    pub fn record(&mut self, a: TeamId, b: TeamId) {
        self.pairs.insert((a, b));
        self.pairs.insert((b, a));
    }

    pub fn contains(&self, a: TeamId, b: TeamId) -> bool {
        self.pairs.contains(&(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Produces the pairings of the next Swiss round
pub trait PairingStrategy: Send + Sync {
    /// Pair `ranked` (best first) without repeating anything in `played`.
    fn pair(&self, ranked: &[TeamId], played: &PlayedPairs) -> Vec<Pairing>;
}

/// Top-down greedy pairing.
///
/// Takes the best unpaired team and gives it the best-ranked opponent it has not
/// met yet; a team with no legal opponent left gets a bye. This is not globally
/// optimal: it can leave wider score gaps than a bucketed matcher with backtracking.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPairing;

impl PairingStrategy for GreedyPairing {
    fn pair(&self, ranked: &[TeamId], played: &PlayedPairs) -> Vec<Pairing> {
        let mut unpaired: Vec<TeamId> = ranked.to_vec();
        let mut pairings = Vec::with_capacity(ranked.len().div_ceil(2));

        while !unpaired.is_empty() {
            let team = unpaired.remove(0);
            let legal = unpaired
                .iter()
                .position(|&other| !played.contains(team, other));
            let opponent = legal.map(|idx| unpaired.remove(idx));
            pairings.push(Pairing {
                team1: team,
                team2: opponent,
            });
        }

        pairings
    }
}

/// Turn pairings into round `round` matches. Byes are stored already completed.
pub fn build_swiss_round(
    tournament_id: TournamentId,
    round: u32,
    pairings: &[Pairing],
    format: MatchFormat,
) -> Vec<Match> {
    pairings
        .iter()
        .enumerate()
        .map(|(position, pairing)| {
            let mut m = Match::new(
                tournament_id,
                MatchPhase::Swiss,
                round,
                position as u32,
                format,
            );
            m.team1 = Some(pairing.team1);
            m.team2 = pairing.team2;
            if pairing.team2.is_none() {
                m.complete_as_bye();
            }
            m
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_round_pairs_in_rank_order() {
        let pairings = GreedyPairing.pair(&[1, 2, 3, 4], &PlayedPairs::default());
        assert_eq!(pairings, vec![Pairing::new(1, 2), Pairing::new(3, 4)]);
    }

    #[test]
    fn test_skips_previous_opponents() {
        let mut played = PlayedPairs::default();
        played.record(1, 2);
        played.record(3, 4);

        let pairings = GreedyPairing.pair(&[1, 2, 3, 4], &played);
        assert_eq!(pairings, vec![Pairing::new(1, 3), Pairing::new(2, 4)]);
    }

    #[test]
    fn test_odd_field_gives_last_team_a_bye() {
        let pairings = GreedyPairing.pair(&[1, 2, 3], &PlayedPairs::default());
        assert_eq!(pairings.len(), 2);
        assert_eq!(pairings[1], Pairing::bye(3));
    }

    #[test]
    fn test_exhausted_pool_gives_bye() {
        let mut played = PlayedPairs::default();
        played.record(1, 2);

        let pairings = GreedyPairing.pair(&[1, 2], &played);
        assert_eq!(pairings, vec![Pairing::bye(1), Pairing::bye(2)]);
    }

    #[test]
    fn test_played_pairs_are_bidirectional() {
        let mut m = Match::new(1, MatchPhase::Swiss, 1, 0, MatchFormat::default());
        m.team1 = Some(8);
        m.team2 = Some(5);
        let mut bye = Match::new(1, MatchPhase::Swiss, 1, 1, MatchFormat::default());
        bye.team1 = Some(2);

        let played = PlayedPairs::from_matches([&m, &bye]);
        assert!(played.contains(8, 5));
        assert!(played.contains(5, 8));
        assert!(!played.contains(2, 5));
        assert_eq!(played.len(), 1);
    }

    #[test]
    fn test_round_matches_complete_byes() {
        let pairings = vec![Pairing::new(1, 2), Pairing::bye(3)];
        let matches = build_swiss_round(1, 4, &pairings, MatchFormat::default());

        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.round == 4 && m.phase == MatchPhase::Swiss));
        assert!(!matches[0].is_completed());
        assert!(matches[1].is_bye());
        assert_eq!(matches[1].winner, Some(3));
    }
}
