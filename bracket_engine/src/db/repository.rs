//! Repository trait definitions for the entity store the engine runs against.
//!
//! The engine only talks to these traits. `PgEntityStore` is the PostgreSQL
//! implementation; [`super::memory::MemoryStore`] keeps everything in process.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};

use crate::bracket::{
    ActivePhase, BracketError, BracketResult, Match, MatchFormat, MatchId, MatchPhase,
    MatchState, Team, TeamId, Tournament, TournamentFormat, TournamentId,
};

/// Optional restrictions for match listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub phase: Option<MatchPhase>,
    pub round: Option<u32>,
    pub state: Option<MatchState>,
}

impl MatchFilter {
    pub fn phase(phase: MatchPhase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    pub fn with_state(mut self, state: MatchState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn matches(&self, m: &Match) -> bool {
        self.phase.is_none_or(|p| p == m.phase)
            && self.round.is_none_or(|r| r == m.round)
            && self.state.is_none_or(|s| s == m.state)
    }
}

/// Everything one bracket generation writes, applied atomically
#[derive(Debug, Clone, Copy)]
pub struct StageChange<'a> {
    pub tournament_id: TournamentId,
    /// Phases whose existing matches are discarded
    pub phases: &'a [MatchPhase],
    pub matches: &'a [Match],
    /// New group labels; `None` leaves the teams untouched
    pub groups: Option<&'a [(TeamId, String)]>,
    pub active_phase: Option<ActivePhase>,
}

/// Trait for tournament repository operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Create a new tournament
    async fn create_tournament(
        &self,
        name: &str,
        slot_count: usize,
        format: TournamentFormat,
    ) -> BracketResult<Tournament>;

    /// Find tournament by ID
    async fn get_tournament(&self, id: TournamentId) -> BracketResult<Option<Tournament>>;

    /// Record the stage the tournament is running
    async fn set_active_phase(
        &self,
        id: TournamentId,
        phase: Option<ActivePhase>,
    ) -> BracketResult<()>;
}

/// Trait for team repository operations
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create a team inside a tournament
    async fn create_team(&self, tournament_id: TournamentId, name: &str) -> BracketResult<Team>;

    /// Teams of a tournament in registration order
    async fn list_teams(&self, tournament_id: TournamentId) -> BracketResult<Vec<Team>>;

    /// Find team by ID
    async fn get_team(&self, id: TeamId) -> BracketResult<Option<Team>>;

    /// Clear every group label of the tournament, then apply `assignments`
    async fn assign_groups(
        &self,
        tournament_id: TournamentId,
        assignments: &[(TeamId, String)],
    ) -> BracketResult<()>;
}

/// Trait for match repository operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Matches of a tournament ordered by `(round, position, created_at)`
    async fn list_matches(
        &self,
        tournament_id: TournamentId,
        filter: MatchFilter,
    ) -> BracketResult<Vec<Match>>;

    /// Find match by ID
    async fn get_match(&self, id: MatchId) -> BracketResult<Option<Match>>;

    /// Insert a batch of matches
    async fn insert_matches(&self, matches: &[Match]) -> BracketResult<()>;

    /// Persist teams, scores, winner and state of each match in one transaction
    async fn update_matches(&self, matches: &[Match]) -> BracketResult<()>;

    /// Delete the tournament's matches in `phases`. Returns the number removed.
    async fn delete_matches(
        &self,
        tournament_id: TournamentId,
        phases: &[MatchPhase],
    ) -> BracketResult<u64>;

    /// Delete the tournament's matches in `phases` and insert `matches`, atomically
    async fn replace_matches(
        &self,
        tournament_id: TournamentId,
        phases: &[MatchPhase],
        matches: &[Match],
    ) -> BracketResult<()>;

    /// Replace matches, re-deal groups and set the active phase in one transaction
    async fn apply_stage(&self, change: StageChange<'_>) -> BracketResult<()>;
}

/// Everything the bracket engine needs from storage
pub trait EntityStore: TournamentRepository + TeamRepository + MatchRepository {}

impl<T: TournamentRepository + TeamRepository + MatchRepository> EntityStore for T {}

/// Default PostgreSQL implementation of the entity store
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_in(
        tx: &mut Transaction<'_, Postgres>,
        matches: &[Match],
    ) -> BracketResult<()> {
        for m in matches {
            sqlx::query(
                r#"
                INSERT INTO matches (id, tournament_id, team1_id, team2_id, winner_id,
                                     team1_score, team2_score, round, position, phase,
                                     group_id, state, next_winner_match, next_loser_match,
                                     match_format, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                "#,
            )
            .bind(m.id)
            .bind(m.tournament_id)
            .bind(m.team1)
            .bind(m.team2)
            .bind(m.winner)
            .bind(m.team1_score)
            .bind(m.team2_score)
            .bind(m.round as i32)
            .bind(m.position as i32)
            .bind(m.phase.as_str())
            .bind(m.group_id.as_deref())
            .bind(m.state.as_str())
            .bind(m.next_winner_match)
            .bind(m.next_loser_match)
            .bind(m.match_format.to_string())
            .bind(m.created_at.naive_utc())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn assign_groups_in(
        tx: &mut Transaction<'_, Postgres>,
        tournament_id: TournamentId,
        assignments: &[(TeamId, String)],
    ) -> BracketResult<()> {
        sqlx::query("UPDATE teams SET group_id = NULL WHERE tournament_id = $1")
            .bind(tournament_id)
            .execute(&mut **tx)
            .await?;

        for (team_id, group) in assignments {
            sqlx::query("UPDATE teams SET group_id = $1 WHERE id = $2 AND tournament_id = $3")
                .bind(group)
                .bind(team_id)
                .bind(tournament_id)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    async fn delete_in(
        tx: &mut Transaction<'_, Postgres>,
        tournament_id: TournamentId,
        phases: &[MatchPhase],
    ) -> BracketResult<u64> {
        let result =
            sqlx::query("DELETE FROM matches WHERE tournament_id = $1 AND phase = ANY($2)")
                .bind(tournament_id)
                .bind(phase_names(phases))
                .execute(&mut **tx)
                .await?;
        Ok(result.rows_affected())
    }
}

const MATCH_COLUMNS: &str = "id, tournament_id, team1_id, team2_id, winner_id, team1_score, \
     team2_score, round, position, phase, group_id, state, next_winner_match, next_loser_match, \
     match_format, created_at";

fn phase_names(phases: &[MatchPhase]) -> Vec<String> {
    phases.iter().map(|p| p.as_str().to_string()).collect()
}

fn tournament_from_row(row: &PgRow) -> BracketResult<Tournament> {
    let format: String = row.get("format");
    let active_phase: Option<String> = row.get("active_phase");
    let slot_count: i32 = row.get("slot_count");

    Ok(Tournament {
        id: row.get("id"),
        name: row.get("name"),
        slot_count: slot_count.max(0) as usize,
        format: TournamentFormat::parse(&format)
            .ok_or_else(|| BracketError::InvalidRecord(format!("tournament format '{format}'")))?,
        active_phase: match active_phase {
            Some(phase) => Some(ActivePhase::parse(&phase).ok_or_else(|| {
                BracketError::InvalidRecord(format!("active phase '{phase}'"))
            })?),
            None => None,
        },
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}

fn team_from_row(row: &PgRow) -> Team {
    Team {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        name: row.get("name"),
        group_id: row.get("group_id"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    }
}

fn match_from_row(row: &PgRow) -> BracketResult<Match> {
    let phase: String = row.get("phase");
    let state: String = row.get("state");
    let format: String = row.get("match_format");
    let round: i32 = row.get("round");
    let position: i32 = row.get("position");

    Ok(Match {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        team1: row.get("team1_id"),
        team2: row.get("team2_id"),
        winner: row.get("winner_id"),
        team1_score: row.get("team1_score"),
        team2_score: row.get("team2_score"),
        round: round.max(0) as u32,
        position: position.max(0) as u32,
        phase: MatchPhase::parse(&phase)
            .ok_or_else(|| BracketError::InvalidRecord(format!("match phase '{phase}'")))?,
        group_id: row.get("group_id"),
        state: MatchState::parse(&state)
            .ok_or_else(|| BracketError::InvalidRecord(format!("match state '{state}'")))?,
        next_winner_match: row.get("next_winner_match"),
        next_loser_match: row.get("next_loser_match"),
        match_format: MatchFormat::parse(&format)
            .ok_or_else(|| BracketError::InvalidRecord(format!("match format '{format}'")))?,
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}

#[async_trait]
impl TournamentRepository for PgEntityStore {
    async fn create_tournament(
        &self,
        name: &str,
        slot_count: usize,
        format: TournamentFormat,
    ) -> BracketResult<Tournament> {
        let row = sqlx::query(
            r#"
            INSERT INTO tournaments (name, slot_count, format)
            VALUES ($1, $2, $3)
            RETURNING id, name, slot_count, format, active_phase, created_at
            "#,
        )
        .bind(name)
        .bind(slot_count as i32)
        .bind(format.as_str())
        .fetch_one(&self.pool)
        .await?;

        tournament_from_row(&row)
    }

    async fn get_tournament(&self, id: TournamentId) -> BracketResult<Option<Tournament>> {
        let row = sqlx::query(
            "SELECT id, name, slot_count, format, active_phase, created_at
             FROM tournaments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn set_active_phase(
        &self,
        id: TournamentId,
        phase: Option<ActivePhase>,
    ) -> BracketResult<()> {
        let result = sqlx::query("UPDATE tournaments SET active_phase = $1 WHERE id = $2")
            .bind(phase.map(|p| p.as_str()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BracketError::TournamentNotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl TeamRepository for PgEntityStore {
    async fn create_team(&self, tournament_id: TournamentId, name: &str) -> BracketResult<Team> {
        let row = sqlx::query(
            r#"
            INSERT INTO teams (tournament_id, name)
            VALUES ($1, $2)
            RETURNING id, tournament_id, name, group_id, created_at
            "#,
        )
        .bind(tournament_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(team_from_row(&row))
    }

    async fn list_teams(&self, tournament_id: TournamentId) -> BracketResult<Vec<Team>> {
        let rows = sqlx::query(
            "SELECT id, tournament_id, name, group_id, created_at
             FROM teams WHERE tournament_id = $1
             ORDER BY created_at, id",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(team_from_row).collect())
    }

    async fn get_team(&self, id: TeamId) -> BracketResult<Option<Team>> {
        let row = sqlx::query(
            "SELECT id, tournament_id, name, group_id, created_at FROM teams WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(team_from_row))
    }

    async fn assign_groups(
        &self,
        tournament_id: TournamentId,
        assignments: &[(TeamId, String)],
    ) -> BracketResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::assign_groups_in(&mut tx, tournament_id, assignments).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl MatchRepository for PgEntityStore {
    async fn list_matches(
        &self,
        tournament_id: TournamentId,
        filter: MatchFilter,
    ) -> BracketResult<Vec<Match>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        query
            .push(MATCH_COLUMNS)
            .push(" FROM matches WHERE tournament_id = ")
            .push_bind(tournament_id);
        if let Some(phase) = filter.phase {
            query.push(" AND phase = ").push_bind(phase.as_str());
        }
        if let Some(round) = filter.round {
            query.push(" AND round = ").push_bind(round as i32);
        }
        if let Some(state) = filter.state {
            query.push(" AND state = ").push_bind(state.as_str());
        }
        query.push(" ORDER BY round, position, created_at");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(match_from_row).collect()
    }

    async fn get_match(&self, id: MatchId) -> BracketResult<Option<Match>> {
        let row = sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn insert_matches(&self, matches: &[Match]) -> BracketResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_in(&mut tx, matches).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_matches(&self, matches: &[Match]) -> BracketResult<()> {
        let mut tx = self.pool.begin().await?;

        for m in matches {
            let result = sqlx::query(
                r#"
                UPDATE matches
                SET team1_id = $1, team2_id = $2, winner_id = $3, team1_score = $4,
                    team2_score = $5, state = $6
                WHERE id = $7
                "#,
            )
            .bind(m.team1)
            .bind(m.team2)
            .bind(m.winner)
            .bind(m.team1_score)
            .bind(m.team2_score)
            .bind(m.state.as_str())
            .bind(m.id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(BracketError::MatchNotFound(m.id));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_matches(
        &self,
        tournament_id: TournamentId,
        phases: &[MatchPhase],
    ) -> BracketResult<u64> {
        let mut tx = self.pool.begin().await?;
        let removed = Self::delete_in(&mut tx, tournament_id, phases).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn replace_matches(
        &self,
        tournament_id: TournamentId,
        phases: &[MatchPhase],
        matches: &[Match],
    ) -> BracketResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::delete_in(&mut tx, tournament_id, phases).await?;
        Self::insert_in(&mut tx, matches).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn apply_stage(&self, change: StageChange<'_>) -> BracketResult<()> {
        let mut tx = self.pool.begin().await?;

        // Lock the tournament row so concurrent generations queue up.
        let found = sqlx::query("SELECT id FROM tournaments WHERE id = $1 FOR UPDATE")
            .bind(change.tournament_id)
            .fetch_optional(&mut *tx)
            .await?;
        if found.is_none() {
            return Err(BracketError::TournamentNotFound(change.tournament_id));
        }

        Self::delete_in(&mut tx, change.tournament_id, change.phases).await?;
        Self::insert_in(&mut tx, change.matches).await?;
        if let Some(groups) = change.groups {
            Self::assign_groups_in(&mut tx, change.tournament_id, groups).await?;
        }
        sqlx::query("UPDATE tournaments SET active_phase = $1 WHERE id = $2")
            .bind(change.active_phase.map(|p| p.as_str()))
            .bind(change.tournament_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
