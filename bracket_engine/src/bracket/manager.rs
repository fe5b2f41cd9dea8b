//! Bracket manager: the engine's public operations.
//!
//! Each operation loads what it needs from the store, runs the pure builders or
//! the [`MatchGraph`] in memory, and writes the outcome back in a single batch.

use super::advancement::{MatchGraph, MatchResult};
use super::double_elim::{build_double_elimination, seeds_from_standings};
use super::errors::{BracketError, BracketResult};
use super::models::{
    ActivePhase, Match, MatchFormat, MatchId, MatchPhase, SlotRef, Team, TeamId, Tournament,
    TournamentFormat, TournamentId,
};
use super::round_robin::{build_group_stage, deal_groups};
use super::single_elim::{bracket_size, build_single_elimination};
use super::standings::{Standing, compute_standings};
use super::swiss::{GreedyPairing, PairingStrategy, PlayedPairs, build_swiss_round};
use crate::config::EngineConfig;
use crate::db::{EntityStore, MatchFilter, StageChange};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Bracket manager
pub struct BracketManager<S: EntityStore> {
    store: Arc<S>,
    config: EngineConfig,
    pairing: Arc<dyn PairingStrategy>,
}

impl<S: EntityStore> Clone for BracketManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config,
            pairing: Arc::clone(&self.pairing),
        }
    }
}

impl<S: EntityStore> BracketManager<S> {
    /// Create a new bracket manager using greedy Swiss pairing
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            pairing: Arc::new(GreedyPairing),
        }
    }

    /// Replace the Swiss pairing strategy
    pub fn with_pairing_strategy(mut self, pairing: Arc<dyn PairingStrategy>) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a new tournament
    pub async fn create_tournament(
        &self,
        name: &str,
        slot_count: usize,
        format: TournamentFormat,
    ) -> BracketResult<Tournament> {
        let tournament = self
            .store
            .create_tournament(name, slot_count, format)
            .await?;
        log::info!(
            "Created tournament {} '{}' ({}, {} slots)",
            tournament.id,
            tournament.name,
            format.as_str(),
            slot_count
        );
        Ok(tournament)
    }

    /// Get tournament by ID
    pub async fn tournament(&self, tournament_id: TournamentId) -> BracketResult<Tournament> {
        self.store
            .get_tournament(tournament_id)
            .await?
            .ok_or(BracketError::TournamentNotFound(tournament_id))
    }

    /// Register a team, refusing once every slot is taken
    pub async fn register_team(
        &self,
        tournament_id: TournamentId,
        name: &str,
    ) -> BracketResult<Team> {
        let tournament = self.tournament(tournament_id).await?;
        let registered = self.store.list_teams(tournament_id).await?.len();
        if registered >= tournament.slot_count {
            return Err(BracketError::CapacityExceeded {
                capacity: tournament.slot_count,
            });
        }

        let team = self.store.create_team(tournament_id, name).await?;
        log::info!(
            "Registered team {} '{}' in tournament {} ({}/{})",
            team.id,
            team.name,
            tournament_id,
            registered + 1,
            tournament.slot_count
        );
        Ok(team)
    }

    /// Generate a single elimination bracket, replacing every match of the tournament.
    ///
    /// Byes are resolved before the bracket is stored.
    pub async fn generate_single_elimination(
        &self,
        tournament_id: TournamentId,
        size_override: Option<usize>,
    ) -> BracketResult<Vec<Match>> {
        let tournament = self.tournament(tournament_id).await?;
        let teams = self.team_ids(tournament_id).await?;
        let size = bracket_size(teams.len(), tournament.slot_count, size_override)?;

        let matches = {
            let mut rng = rand::rng();
            build_single_elimination(
                tournament_id,
                &teams,
                size,
                self.config.bracket_format,
                &mut rng,
            )
        };

        self.store
            .apply_stage(StageChange {
                tournament_id,
                phases: &MatchPhase::ALL,
                matches: &matches,
                groups: None,
                active_phase: Some(ActivePhase::Playoffs),
            })
            .await?;

        log::info!(
            "Generated single elimination for tournament {}: {} teams, size {}, {} matches",
            tournament_id,
            teams.len(),
            size,
            matches.len()
        );
        Ok(matches)
    }

    /// Deal teams into groups and schedule a round robin inside each group.
    pub async fn generate_group_stage(
        &self,
        tournament_id: TournamentId,
        group_count: usize,
        format: Option<MatchFormat>,
    ) -> BracketResult<Vec<Match>> {
        self.tournament(tournament_id).await?;
        let teams = self.team_ids(tournament_id).await?;
        let format = format.unwrap_or(self.config.group_stage_format);

        let groups = {
            let mut rng = rand::rng();
            deal_groups(&teams, group_count, &mut rng)?
        };
        let matches = build_group_stage(tournament_id, &groups, format);

        let assignments: Vec<(TeamId, String)> = groups
            .iter()
            .flat_map(|g| g.teams.iter().map(|&t| (t, g.label.clone())))
            .collect();
        self.store
            .apply_stage(StageChange {
                tournament_id,
                phases: &[MatchPhase::GroupStage],
                matches: &matches,
                groups: Some(assignments.as_slice()),
                active_phase: Some(ActivePhase::GroupStage),
            })
            .await?;

        log::info!(
            "Generated group stage for tournament {}: {} teams in {} groups, {} matches ({})",
            tournament_id,
            teams.len(),
            group_count,
            matches.len(),
            format
        );
        Ok(matches)
    }

    /// Seed the 16-team double elimination template from the group standings.
    pub async fn generate_double_elimination(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Vec<Match>> {
        self.tournament(tournament_id).await?;
        let standings = self.group_standings(tournament_id).await?;
        let seeds = seeds_from_standings(&standings)?;

        let matches = build_double_elimination(
            tournament_id,
            &seeds,
            self.config.bracket_format,
            self.config.grand_final_format,
        );

        self.store
            .apply_stage(StageChange {
                tournament_id,
                phases: &MatchPhase::PLAYOFFS,
                matches: &matches,
                groups: None,
                active_phase: Some(ActivePhase::Playoffs),
            })
            .await?;

        log::info!(
            "Generated double elimination for tournament {}: {} matches",
            tournament_id,
            matches.len()
        );
        Ok(matches)
    }

    /// Pair the next Swiss round once every match of the current one is done.
    pub async fn generate_next_swiss_round(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Vec<Match>> {
        self.tournament(tournament_id).await?;
        let teams = self.store.list_teams(tournament_id).await?;
        if teams.len() < 2 {
            return Err(BracketError::InsufficientTeams {
                needed: 2,
                current: teams.len(),
            });
        }

        let history = self
            .store
            .list_matches(tournament_id, MatchFilter::phase(MatchPhase::Swiss))
            .await?;
        let current_round = history.iter().map(|m| m.round).max().unwrap_or(0);
        if history
            .iter()
            .any(|m| m.round == current_round && !m.is_completed())
        {
            return Err(BracketError::RoundIncomplete {
                round: current_round,
            });
        }

        let ranked: Vec<TeamId> = compute_standings(&teams, &history)
            .iter()
            .map(|s| s.team_id)
            .collect();
        let played = PlayedPairs::from_matches(&history);
        let pairings = self.pairing.pair(&ranked, &played);

        let round = current_round + 1;
        let matches =
            build_swiss_round(tournament_id, round, &pairings, self.config.swiss_format);
        self.store.insert_matches(&matches).await?;

        log::info!(
            "Generated Swiss round {} for tournament {}: {} matches, {} byes",
            round,
            tournament_id,
            matches.len(),
            matches.iter().filter(|m| m.is_bye()).count()
        );
        Ok(matches)
    }

    /// Mark a match with both teams seated as being played.
    pub async fn start_match(&self, match_id: MatchId) -> BracketResult<Match> {
        let mut graph = self.graph_for(match_id).await?;
        let touched = graph.start(match_id)?;
        self.store.update_matches(&graph.collect(&touched)).await?;

        log::info!("Match {} is live", match_id);
        Ok(graph.get(match_id)?.clone())
    }

    /// Report the final result of a match and advance its teams.
    ///
    /// Returns the completed match.
    pub async fn report_result(
        &self,
        match_id: MatchId,
        result: MatchResult,
    ) -> BracketResult<Match> {
        let mut graph = self.graph_for(match_id).await?;
        let touched = graph.complete(match_id, &result)?;
        self.store.update_matches(&graph.collect(&touched)).await?;

        let completed = graph.get(match_id)?.clone();
        match completed.winner {
            Some(winner) => log::info!(
                "Match {} completed {}-{}, winner {}",
                match_id,
                completed.team1_score,
                completed.team2_score,
                winner
            ),
            None => log::info!(
                "Match {} completed {}-{} as a draw",
                match_id,
                completed.team1_score,
                completed.team2_score
            ),
        }
        Ok(completed)
    }

    /// Reset a completed match to pending, clearing everything it advanced.
    ///
    /// Returns every match that changed.
    pub async fn reset_match(&self, match_id: MatchId) -> BracketResult<Vec<Match>> {
        let mut graph = self.graph_for(match_id).await?;
        let touched = graph.reset(match_id)?;
        let changed = graph.collect(&touched);
        self.store.update_matches(&changed).await?;

        if changed.len() > 1 {
            log::warn!(
                "Reset of match {} cleared {} downstream matches",
                match_id,
                changed.len() - 1
            );
        } else {
            log::info!("Reset match {}", match_id);
        }
        Ok(changed)
    }

    /// Swap the occupants of two slots of unfinished matches.
    pub async fn swap_slots(&self, a: SlotRef, b: SlotRef) -> BracketResult<Vec<Match>> {
        let mut graph = self.graph_for(a.match_id).await?;
        let touched = graph.swap_slots(a, b)?;
        let changed = graph.collect(&touched);
        self.store.update_matches(&changed).await?;

        log::info!(
            "Swapped {}:{:?} with {}:{:?}",
            a.match_id,
            a.slot,
            b.match_id,
            b.slot
        );
        Ok(changed)
    }

    /// Empty a slot. Returns the team that was removed, if any.
    pub async fn remove_team(&self, at: SlotRef) -> BracketResult<Option<TeamId>> {
        let mut graph = self.graph_for(at.match_id).await?;
        let removed = graph.remove_team(at)?;
        self.store
            .update_matches(&[graph.get(at.match_id)?.clone()])
            .await?;

        log::info!("Removed team {:?} from {}:{:?}", removed, at.match_id, at.slot);
        Ok(removed)
    }

    /// Put a team of the same tournament into an empty slot.
    pub async fn assign_team(&self, at: SlotRef, team_id: TeamId) -> BracketResult<Match> {
        let mut graph = self.graph_for(at.match_id).await?;
        let tournament_id = graph.get(at.match_id)?.tournament_id;
        let team = self
            .store
            .get_team(team_id)
            .await?
            .filter(|t| t.tournament_id == Some(tournament_id))
            .ok_or(BracketError::TeamNotFound(team_id))?;

        graph.assign_team(at, team.id)?;
        let updated = graph.get(at.match_id)?.clone();
        self.store
            .update_matches(std::slice::from_ref(&updated))
            .await?;

        log::info!("Assigned team {} to {}:{:?}", team.id, at.match_id, at.slot);
        Ok(updated)
    }

    /// Standings of every team from the completed matches of `phase`
    pub async fn standings(
        &self,
        tournament_id: TournamentId,
        phase: MatchPhase,
    ) -> BracketResult<Vec<Standing>> {
        self.tournament(tournament_id).await?;
        let teams = self.store.list_teams(tournament_id).await?;
        let matches = self
            .store
            .list_matches(tournament_id, MatchFilter::phase(phase))
            .await?;
        Ok(compute_standings(&teams, &matches))
    }

    /// Group stage standings per group label
    pub async fn group_standings(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<BTreeMap<String, Vec<Standing>>> {
        let teams = self.store.list_teams(tournament_id).await?;
        let matches = self
            .store
            .list_matches(tournament_id, MatchFilter::phase(MatchPhase::GroupStage))
            .await?;

        let mut groups: BTreeMap<String, Vec<Team>> = BTreeMap::new();
        for team in teams {
            if let Some(label) = team.group_id.clone() {
                groups.entry(label).or_default().push(team);
            }
        }

        Ok(groups
            .into_iter()
            .map(|(label, members)| {
                let table = compute_standings(&members, &matches);
                (label, table)
            })
            .collect())
    }

    /// Current matches of a tournament, optionally restricted to one phase
    pub async fn bracket(
        &self,
        tournament_id: TournamentId,
        phase: Option<MatchPhase>,
    ) -> BracketResult<Vec<Match>> {
        self.tournament(tournament_id).await?;
        let filter = MatchFilter {
            phase,
            ..MatchFilter::default()
        };
        self.store.list_matches(tournament_id, filter).await
    }

    async fn team_ids(&self, tournament_id: TournamentId) -> BracketResult<Vec<TeamId>> {
        Ok(self
            .store
            .list_teams(tournament_id)
            .await?
            .iter()
            .map(|t| t.id)
            .collect())
    }

    /// Load the whole match graph of the tournament `match_id` belongs to
    async fn graph_for(&self, match_id: MatchId) -> BracketResult<MatchGraph> {
        let m = self
            .store
            .get_match(match_id)
            .await?
            .ok_or(BracketError::MatchNotFound(match_id))?;
        let matches = self
            .store
            .list_matches(m.tournament_id, MatchFilter::default())
            .await?;
        Ok(MatchGraph::new(matches))
    }
}
