//! Single elimination bracket construction.
//!
//! The builder lays out every round up front, links each match `i` of round `r`
//! to match `⌊i/2⌋` of round `r + 1` through `next_winner_match`, places the
//! shuffled teams into round 1 and then resolves byes before anything is stored.

use super::errors::{BracketError, BracketResult};
use super::models::{Match, MatchFormat, MatchId, MatchPhase, Slot, TeamId, TournamentId};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

/// Resolve the bracket size for `team_count` teams.
///
/// An explicit override must be a power of two and hold every team. Without one
/// the smallest power of two covering both the configured slots and the teams is used.
pub fn bracket_size(
    team_count: usize,
    slot_count: usize,
    size_override: Option<usize>,
) -> BracketResult<usize> {
    if team_count < 2 {
        return Err(BracketError::InsufficientTeams {
            needed: 2,
            current: team_count,
        });
    }

    match size_override {
        Some(size) if size.is_power_of_two() && size >= team_count => Ok(size),
        Some(size) => Err(BracketError::InvalidBracketSize {
            size,
            teams: team_count,
        }),
        None => Ok(slot_count.max(team_count).next_power_of_two()),
    }
}

/// Build a complete single elimination graph of `size - 1` matches.
///
/// `size` must already be validated by [`bracket_size`].
pub fn build_single_elimination<R: Rng + ?Sized>(
    tournament_id: TournamentId,
    teams: &[TeamId],
    size: usize,
    format: MatchFormat,
    rng: &mut R,
) -> Vec<Match> {
    let rounds = size.trailing_zeros();
    let mut matches = Vec::with_capacity(size.saturating_sub(1));
    let mut round_start = Vec::with_capacity(rounds as usize);

    for round in 1..=rounds {
        round_start.push(matches.len());
        for position in 0..(size >> round) {
            matches.push(Match::new(
                tournament_id,
                MatchPhase::SingleElim,
                round,
                position as u32,
                format,
            ));
        }
    }

    for round in 1..rounds as usize {
        let count = size >> round;
        for position in 0..count {
            let next = matches[round_start[round] + position / 2].id;
            matches[round_start[round - 1] + position].next_winner_match = Some(next);
        }
    }

    let mut seeded = teams.to_vec();
    seeded.shuffle(rng);

    // Teams 2i and 2i + 1 take the two slots of opening match i.
    for (k, team) in seeded.into_iter().enumerate() {
        let slot = if k % 2 == 0 { Slot::One } else { Slot::Two };
        matches[k / 2].set_team(slot, Some(team));
    }

    resolve_byes(&mut matches);
    matches
}

/// Auto-complete every match that can only ever hold one team.
///
/// `matches` must be in topological order (creation order). A match with no
/// outstanding feeders and one team becomes a completed bye and its team moves on;
/// one with no teams at all is void and simply stops feeding its successor.
pub fn resolve_byes(matches: &mut [Match]) -> usize {
    let index: HashMap<MatchId, usize> = matches
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id, i))
        .collect();

    let mut outstanding = vec![0usize; matches.len()];
    for m in matches.iter() {
        if let Some(j) = m.next_winner_match.and_then(|next| index.get(&next)) {
            outstanding[*j] += 1;
        }
    }

    let mut byes = 0;
    for i in 0..matches.len() {
        if outstanding[i] > 0 || matches[i].team_count() == 2 || matches[i].is_completed() {
            continue;
        }

        let advanced = matches[i].complete_as_bye();
        if advanced.is_some() {
            byes += 1;
            log::debug!(
                "Bye in round {} position {} resolved",
                matches[i].round,
                matches[i].position
            );
        }

        let Some(j) = matches[i]
            .next_winner_match
            .and_then(|next| index.get(&next).copied())
        else {
            continue;
        };

        outstanding[j] -= 1;
        if let Some(team) = advanced {
            if let Some(slot) = matches[j].first_empty_slot() {
                matches[j].set_team(slot, Some(team));
            }
        }
    }

    byes
}
