//! Fixed 16-team double elimination template seeded from four groups.
//!
//! Group winners start in upper round 2, runners-up and third places meet
//! cross-group in upper round 1, fourth places start in the lower bracket.
//! Every relationship is an explicit winner/loser edge.
//!
//! ```text
//! upper  R1 (4) -> R2 (4) -> R3 (2) -> R4 (1) ----------------> grand final
//!          |         |         |         |                          ^
//! lower  R1 (4) -> R2 (4) -> R3 (2) -> R4 (2) -> R5 (1) -> R6 (1) --+
//! ```

use super::errors::{BracketError, BracketResult};
use super::models::{Match, MatchFormat, MatchPhase, Slot, TeamId, TournamentId};
use super::standings::Standing;
use std::collections::BTreeMap;

/// Groups feeding the template, in seeding order
pub const SEEDED_GROUPS: [&str; 4] = ["A", "B", "C", "D"];

/// Teams taken from each group
pub const TEAMS_PER_GROUP: usize = 4;

/// Total matches in the template: 11 upper, 14 lower, 1 grand final
pub const TEMPLATE_MATCH_COUNT: usize = 26;

const A: usize = 0;
const B: usize = 1;
const C: usize = 2;
const D: usize = 3;

/// `seeds[group][rank - 1]` for groups A..D
pub type GroupSeeds = [[TeamId; TEAMS_PER_GROUP]; 4];

/// Read the top four of groups A..D from per-group standings.
pub fn seeds_from_standings(
    standings: &BTreeMap<String, Vec<Standing>>,
) -> BracketResult<GroupSeeds> {
    let mut seeds = [[0; TEAMS_PER_GROUP]; 4];

    for (g, label) in SEEDED_GROUPS.iter().enumerate() {
        let table = standings.get(*label).map(Vec::as_slice).unwrap_or_default();
        if table.len() < TEAMS_PER_GROUP {
            return Err(BracketError::InsufficientGroupSize {
                group: (*label).to_string(),
                needed: TEAMS_PER_GROUP,
                current: table.len(),
            });
        }
        for (rank, standing) in table.iter().take(TEAMS_PER_GROUP).enumerate() {
            seeds[g][rank] = standing.team_id;
        }
    }

    Ok(seeds)
}

struct GraphBuilder {
    tournament_id: TournamentId,
    matches: Vec<Match>,
}

impl GraphBuilder {
    fn round(
        &mut self,
        phase: MatchPhase,
        round: u32,
        count: usize,
        format: MatchFormat,
    ) -> Vec<usize> {
        (0..count)
            .map(|position| {
                self.matches.push(Match::new(
                    self.tournament_id,
                    phase,
                    round,
                    position as u32,
                    format,
                ));
                self.matches.len() - 1
            })
            .collect()
    }

    fn seed(&mut self, at: usize, team1: TeamId, team2: Option<TeamId>) {
        self.matches[at].set_team(Slot::One, Some(team1));
        self.matches[at].set_team(Slot::Two, team2);
    }

    fn winner_to(&mut self, from: usize, to: usize) {
        self.matches[from].next_winner_match = Some(self.matches[to].id);
    }

    fn loser_to(&mut self, from: usize, to: usize) {
        self.matches[from].next_loser_match = Some(self.matches[to].id);
    }
}

/// Build the 26-match template. All matches start pending.
pub fn build_double_elimination(
    tournament_id: TournamentId,
    seeds: &GroupSeeds,
    format: MatchFormat,
    final_format: MatchFormat,
) -> Vec<Match> {
    let seed = |group: usize, rank: usize| seeds[group][rank - 1];
    let mut g = GraphBuilder {
        tournament_id,
        matches: Vec::with_capacity(TEMPLATE_MATCH_COUNT),
    };

    let ur1 = g.round(MatchPhase::UpperBracket, 1, 4, format);
    let ur2 = g.round(MatchPhase::UpperBracket, 2, 4, format);
    let ur3 = g.round(MatchPhase::UpperBracket, 3, 2, format);
    let ur4 = g.round(MatchPhase::UpperBracket, 4, 1, format);
    let lr1 = g.round(MatchPhase::LowerBracket, 1, 4, format);
    let lr2 = g.round(MatchPhase::LowerBracket, 2, 4, format);
    let lr3 = g.round(MatchPhase::LowerBracket, 3, 2, format);
    let lr4 = g.round(MatchPhase::LowerBracket, 4, 2, format);
    let lr5 = g.round(MatchPhase::LowerBracket, 5, 1, format);
    let lr6 = g.round(MatchPhase::LowerBracket, 6, 1, format);
    let gf = g.round(MatchPhase::GrandFinals, 1, 1, final_format);

    // Upper round 1: runners-up against third places of a neighbouring group.
    g.seed(ur1[0], seed(A, 2), Some(seed(B, 3)));
    g.seed(ur1[1], seed(C, 2), Some(seed(D, 3)));
    g.seed(ur1[2], seed(B, 2), Some(seed(A, 3)));
    g.seed(ur1[3], seed(D, 2), Some(seed(C, 3)));

    // Upper round 2: group winners wait for a round 1 winner from other groups.
    g.seed(ur2[0], seed(A, 1), None);
    g.seed(ur2[1], seed(B, 1), None);
    g.seed(ur2[2], seed(C, 1), None);
    g.seed(ur2[3], seed(D, 1), None);
    g.winner_to(ur1[1], ur2[0]);
    g.winner_to(ur1[3], ur2[1]);
    g.winner_to(ur1[0], ur2[2]);
    g.winner_to(ur1[2], ur2[3]);

    g.winner_to(ur2[0], ur3[0]);
    g.winner_to(ur2[2], ur3[0]);
    g.winner_to(ur2[1], ur3[1]);
    g.winner_to(ur2[3], ur3[1]);

    g.winner_to(ur3[0], ur4[0]);
    g.winner_to(ur3[1], ur4[0]);
    g.winner_to(ur4[0], gf[0]);

    // Lower round 1: fourth places take on upper round 1 losers.
    g.seed(lr1[0], seed(C, 4), None);
    g.seed(lr1[1], seed(A, 4), None);
    g.seed(lr1[2], seed(D, 4), None);
    g.seed(lr1[3], seed(B, 4), None);
    for i in 0..4 {
        g.loser_to(ur1[i], lr1[i]);
        g.winner_to(lr1[i], lr2[i]);
        // Crossed so early rematches are pushed apart.
        g.loser_to(ur2[3 - i], lr2[i]);
    }

    g.winner_to(lr2[0], lr3[0]);
    g.winner_to(lr2[1], lr3[0]);
    g.winner_to(lr2[2], lr3[1]);
    g.winner_to(lr2[3], lr3[1]);

    for i in 0..2 {
        g.winner_to(lr3[i], lr4[i]);
        g.loser_to(ur3[1 - i], lr4[i]);
        g.winner_to(lr4[i], lr5[0]);
    }

    g.winner_to(lr5[0], lr6[0]);
    g.loser_to(ur4[0], lr6[0]);
    g.winner_to(lr6[0], gf[0]);

    g.matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::models::{MatchId, MatchState};
    use std::collections::HashMap;

    fn seeds() -> GroupSeeds {
        // Team ID encodes group and rank: 11 = A1, 24 = B4 ...
        let mut seeds = [[0; 4]; 4];
        for (g, row) in seeds.iter_mut().enumerate() {
            for (r, team) in row.iter_mut().enumerate() {
                *team = ((g + 1) * 10 + r + 1) as TeamId;
            }
        }
        seeds
    }

    fn build() -> Vec<Match> {
        build_double_elimination(1, &seeds(), MatchFormat::best_of(3), MatchFormat::best_of(5))
    }

    #[test]
    fn test_template_shape() {
        let matches = build();
        assert_eq!(matches.len(), TEMPLATE_MATCH_COUNT);

        let count = |phase| matches.iter().filter(|m| m.phase == phase).count();
        assert_eq!(count(MatchPhase::UpperBracket), 11);
        assert_eq!(count(MatchPhase::LowerBracket), 14);
        assert_eq!(count(MatchPhase::GrandFinals), 1);
        assert!(matches.iter().all(|m| m.state == MatchState::Pending));

        let gf = matches
            .iter()
            .find(|m| m.phase == MatchPhase::GrandFinals)
            .unwrap();
        assert_eq!(gf.match_format, MatchFormat::best_of(5));
    }

    #[test]
    fn test_every_team_seeded_once() {
        let matches = build();
        let mut seen: Vec<TeamId> = matches
            .iter()
            .flat_map(|m| [m.team1, m.team2])
            .flatten()
            .collect();
        seen.sort_unstable();
        let mut expected: Vec<TeamId> = seeds().iter().flatten().copied().collect();
        expected.sort_unstable();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_each_slot_has_one_producer() {
        let matches = build();
        let mut producers: HashMap<MatchId, usize> = HashMap::new();
        for m in &matches {
            for next in [m.next_winner_match, m.next_loser_match].into_iter().flatten() {
                *producers.entry(next).or_default() += 1;
            }
        }

        for m in &matches {
            let incoming = producers.get(&m.id).copied().unwrap_or(0);
            assert_eq!(
                incoming + m.team_count(),
                2,
                "{} round {} position {} is over or under fed",
                m.phase,
                m.round,
                m.position
            );
        }
    }

    #[test]
    fn test_upper_round_one_is_cross_group() {
        let matches = build();
        for m in matches
            .iter()
            .filter(|m| m.phase == MatchPhase::UpperBracket && m.round == 1)
        {
            let (t1, t2) = (m.team1.unwrap(), m.team2.unwrap());
            assert_ne!(t1 / 10, t2 / 10);
        }
    }

    #[test]
    fn test_only_upper_matches_drop_losers() {
        let matches = build();
        for m in &matches {
            if m.next_loser_match.is_some() {
                assert_eq!(m.phase, MatchPhase::UpperBracket);
            }
        }
        let dropping = matches
            .iter()
            .filter(|m| m.next_loser_match.is_some())
            .count();
        assert_eq!(dropping, 11);
    }

    #[test]
    fn test_seeds_require_four_per_group() {
        let mut standings = BTreeMap::new();
        for label in SEEDED_GROUPS {
            let table = (0..4)
                .map(|i| Standing::new(i, format!("{label}{i}"), Some(label.to_string())))
                .collect();
            standings.insert(label.to_string(), table);
        }
        assert!(seeds_from_standings(&standings).is_ok());

        standings.get_mut("C").unwrap().pop();
        let err = seeds_from_standings(&standings).unwrap_err();
        assert!(matches!(
            err,
            BracketError::InsufficientGroupSize { ref group, needed: 4, current: 3 } if group == "C"
        ));

        standings.remove("D");
        standings.get_mut("C").unwrap().push(Standing::new(99, "C9".into(), None));
        assert!(matches!(
            seeds_from_standings(&standings),
            Err(BracketError::InsufficientGroupSize { current: 0, .. })
        ));
    }
}
