//! In-process entity store.
//!
//! Holds everything behind one async mutex, so every batch operation is atomic
//! the same way the PostgreSQL transactions are. Used by tests and by embedders
//! that do not need durability.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::repository::{
    MatchFilter, MatchRepository, StageChange, TeamRepository, TournamentRepository,
};
use crate::bracket::{
    ActivePhase, BracketError, BracketResult, Match, MatchId, MatchPhase, Team, TeamId,
    Tournament, TournamentFormat, TournamentId,
};

#[derive(Default)]
struct Tables {
    next_tournament_id: TournamentId,
    next_team_id: TeamId,
    tournaments: HashMap<TournamentId, Tournament>,
    teams: Vec<Team>,
    /// Insertion order doubles as creation order
    matches: Vec<Match>,
}

impl Tables {
    fn assign_groups(&mut self, tournament_id: TournamentId, assignments: &[(TeamId, String)]) {
        let groups: HashMap<TeamId, &String> =
            assignments.iter().map(|(id, group)| (*id, group)).collect();

        for team in self
            .teams
            .iter_mut()
            .filter(|t| t.tournament_id == Some(tournament_id))
        {
            team.group_id = groups.get(&team.id).map(|g| (*g).clone());
        }
    }

    fn replace_matches(
        &mut self,
        tournament_id: TournamentId,
        phases: &[MatchPhase],
        matches: &[Match],
    ) {
        self.matches
            .retain(|m| m.tournament_id != tournament_id || !phases.contains(&m.phase));
        self.matches.extend_from_slice(matches);
    }
}

/// Entity store kept entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TournamentRepository for MemoryStore {
    async fn create_tournament(
        &self,
        name: &str,
        slot_count: usize,
        format: TournamentFormat,
    ) -> BracketResult<Tournament> {
        let mut tables = self.tables.lock().await;
        tables.next_tournament_id += 1;

        let tournament = Tournament {
            id: tables.next_tournament_id,
            name: name.to_string(),
            slot_count,
            format,
            active_phase: None,
            created_at: Utc::now(),
        };
        tables.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn get_tournament(&self, id: TournamentId) -> BracketResult<Option<Tournament>> {
        Ok(self.tables.lock().await.tournaments.get(&id).cloned())
    }

    async fn set_active_phase(
        &self,
        id: TournamentId,
        phase: Option<ActivePhase>,
    ) -> BracketResult<()> {
        let mut tables = self.tables.lock().await;
        let tournament = tables
            .tournaments
            .get_mut(&id)
            .ok_or(BracketError::TournamentNotFound(id))?;
        tournament.active_phase = phase;
        Ok(())
    }
}

#[async_trait]
impl TeamRepository for MemoryStore {
    async fn create_team(&self, tournament_id: TournamentId, name: &str) -> BracketResult<Team> {
        let mut tables = self.tables.lock().await;
        if !tables.tournaments.contains_key(&tournament_id) {
            return Err(BracketError::TournamentNotFound(tournament_id));
        }
        tables.next_team_id += 1;

        let team = Team {
            id: tables.next_team_id,
            tournament_id: Some(tournament_id),
            name: name.to_string(),
            group_id: None,
            created_at: Utc::now(),
        };
        tables.teams.push(team.clone());
        Ok(team)
    }

    async fn list_teams(&self, tournament_id: TournamentId) -> BracketResult<Vec<Team>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .teams
            .iter()
            .filter(|t| t.tournament_id == Some(tournament_id))
            .cloned()
            .collect())
    }

    async fn get_team(&self, id: TeamId) -> BracketResult<Option<Team>> {
        let tables = self.tables.lock().await;
        Ok(tables.teams.iter().find(|t| t.id == id).cloned())
    }

    async fn assign_groups(
        &self,
        tournament_id: TournamentId,
        assignments: &[(TeamId, String)],
    ) -> BracketResult<()> {
        self.tables
            .lock()
            .await
            .assign_groups(tournament_id, assignments);
        Ok(())
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn list_matches(
        &self,
        tournament_id: TournamentId,
        filter: MatchFilter,
    ) -> BracketResult<Vec<Match>> {
        let tables = self.tables.lock().await;
        let mut matches: Vec<Match> = tables
            .matches
            .iter()
            .filter(|m| m.tournament_id == tournament_id && filter.matches(m))
            .cloned()
            .collect();
        // Stable: equal keys keep insertion order.
        matches.sort_by_key(|m| (m.round, m.position, m.created_at));
        Ok(matches)
    }

    async fn get_match(&self, id: MatchId) -> BracketResult<Option<Match>> {
        let tables = self.tables.lock().await;
        Ok(tables.matches.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_matches(&self, matches: &[Match]) -> BracketResult<()> {
        self.tables.lock().await.matches.extend_from_slice(matches);
        Ok(())
    }

    async fn update_matches(&self, matches: &[Match]) -> BracketResult<()> {
        let mut tables = self.tables.lock().await;

        let index: HashMap<MatchId, usize> = tables
            .matches
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id, i))
            .collect();
        // Validate the whole batch before touching anything.
        let mut targets = Vec::with_capacity(matches.len());
        for m in matches {
            let i = *index.get(&m.id).ok_or(BracketError::MatchNotFound(m.id))?;
            targets.push(i);
        }

        for (m, i) in matches.iter().zip(targets) {
            let stored = &mut tables.matches[i];
            stored.team1 = m.team1;
            stored.team2 = m.team2;
            stored.winner = m.winner;
            stored.team1_score = m.team1_score;
            stored.team2_score = m.team2_score;
            stored.state = m.state;
        }
        Ok(())
    }

    async fn delete_matches(
        &self,
        tournament_id: TournamentId,
        phases: &[MatchPhase],
    ) -> BracketResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.matches.len();
        tables
            .matches
            .retain(|m| m.tournament_id != tournament_id || !phases.contains(&m.phase));
        Ok((before - tables.matches.len()) as u64)
    }

    async fn replace_matches(
        &self,
        tournament_id: TournamentId,
        phases: &[MatchPhase],
        matches: &[Match],
    ) -> BracketResult<()> {
        self.tables
            .lock()
            .await
            .replace_matches(tournament_id, phases, matches);
        Ok(())
    }

    async fn apply_stage(&self, change: StageChange<'_>) -> BracketResult<()> {
        let mut tables = self.tables.lock().await;
        let tournament = tables
            .tournaments
            .get_mut(&change.tournament_id)
            .ok_or(BracketError::TournamentNotFound(change.tournament_id))?;
        tournament.active_phase = change.active_phase;

        tables.replace_matches(change.tournament_id, change.phases, change.matches);
        if let Some(groups) = change.groups {
            tables.assign_groups(change.tournament_id, groups);
        }
        Ok(())
    }
}
