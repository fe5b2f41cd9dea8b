//! Group dealing and circle-method round-robin scheduling.

use super::errors::{BracketError, BracketResult};
use super::models::{Match, MatchFormat, MatchPhase, TeamId, TournamentId};
use rand::Rng;
use rand::seq::SliceRandom;

/// Group labels in dealing order
pub const GROUP_LABELS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

/// A named group and its members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub label: String,
    pub teams: Vec<TeamId>,
}

/// Shuffle `teams` and deal them one at a time into `group_count` groups.
pub fn deal_groups<R: Rng + ?Sized>(
    teams: &[TeamId],
    group_count: usize,
    rng: &mut R,
) -> BracketResult<Vec<Group>> {
    if group_count == 0 || group_count > GROUP_LABELS.len() {
        return Err(BracketError::InvalidGroupCount(group_count));
    }
    if teams.len() < group_count {
        return Err(BracketError::InsufficientTeams {
            needed: group_count,
            current: teams.len(),
        });
    }

    let mut shuffled = teams.to_vec();
    shuffled.shuffle(rng);

    let mut groups: Vec<Group> = GROUP_LABELS[..group_count]
        .iter()
        .map(|label| Group {
            label: (*label).to_string(),
            teams: Vec::with_capacity(teams.len() / group_count + 1),
        })
        .collect();

    for (i, team) in shuffled.into_iter().enumerate() {
        groups[i % group_count].teams.push(team);
    }

    Ok(groups)
}

/// Schedule every pairing of `teams` exactly once.
///
/// Returns one vector of pairings per round. An odd field gets a placeholder
/// whose pairings are dropped, giving `n` rounds instead of `n - 1`.
pub fn circle_schedule(teams: &[TeamId]) -> Vec<Vec<(TeamId, TeamId)>> {
    let mut ring: Vec<Option<TeamId>> = teams.iter().copied().map(Some).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }

    let n = ring.len();
    if n < 2 {
        return Vec::new();
    }

    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let pairings = (0..n / 2)
            .filter_map(|i| match (ring[i], ring[n - 1 - i]) {
                (Some(home), Some(away)) => Some((home, away)),
                _ => None,
            })
            .collect();
        rounds.push(pairings);

        // First position stays fixed, the rest turn one step.
        ring[1..].rotate_right(1);
    }

    rounds
}

/// Build the group stage matches for every group.
pub fn build_group_stage(
    tournament_id: TournamentId,
    groups: &[Group],
    format: MatchFormat,
) -> Vec<Match> {
    let mut matches = Vec::new();

    for group in groups {
        for (r, pairings) in circle_schedule(&group.teams).into_iter().enumerate() {
            for (position, (home, away)) in pairings.into_iter().enumerate() {
                let mut m = Match::new(
                    tournament_id,
                    MatchPhase::GroupStage,
                    r as u32 + 1,
                    position as u32,
                    format,
                );
                m.team1 = Some(home);
                m.team2 = Some(away);
                m.group_id = Some(group.label.clone());
                matches.push(m);
            }
        }
    }

    matches
}
