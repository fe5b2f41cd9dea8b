//! Integration tests for result reporting, resets and manual edits

use bracket_engine::bracket::{
    BracketError, BracketManager, Match, MatchPhase, MatchResult, MatchState, Slot, SlotRef,
    TournamentFormat, TournamentId,
};
use bracket_engine::config::EngineConfig;
use bracket_engine::db::{MatchRepository, MemoryStore};
use std::sync::Arc;

async fn bracket_of(
    teams: usize,
    format: TournamentFormat,
) -> (BracketManager<MemoryStore>, TournamentId) {
    let manager = BracketManager::new(Arc::new(MemoryStore::new()), EngineConfig::default());
    let tournament = manager.create_tournament("Cup", teams, format).await.unwrap();
    for i in 0..teams {
        manager
            .register_team(tournament.id, &format!("Team {}", i + 1))
            .await
            .unwrap();
    }
    (manager, tournament.id)
}

async fn fetch(manager: &BracketManager<MemoryStore>, m: &Match) -> Match {
    manager.store().get_match(m.id).await.unwrap().unwrap()
}

async fn round(
    manager: &BracketManager<MemoryStore>,
    tid: TournamentId,
    r: u32,
) -> Vec<Match> {
    manager
        .bracket(tid, None)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.round == r)
        .collect()
}

/// Report every playable match, team 1 winning, until nothing is left to play.
async fn play_out(manager: &BracketManager<MemoryStore>, tid: TournamentId) -> usize {
    let mut played = 0;
    loop {
        let ready: Vec<Match> = manager
            .bracket(tid, None)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| !m.is_completed() && m.team_count() == 2)
            .collect();
        if ready.is_empty() {
            return played;
        }
        for m in ready {
            manager
                .report_result(m.id, MatchResult::new(2, 1))
                .await
                .unwrap();
            played += 1;
        }
    }
}

#[tokio::test]
async fn test_winners_fill_first_empty_slot() {
    let (manager, tid) = bracket_of(8, TournamentFormat::SingleElimination).await;
    manager.generate_single_elimination(tid, None).await.unwrap();

    let openers = round(&manager, tid, 1).await;
    let before = round(&manager, tid, 2).await;
    assert!(before.iter().all(|m| m.team_count() == 0));

    // Play the second feeder of each pair first: its winner still lands in slot 1.
    for m in openers.iter().rev() {
        manager
            .report_result(m.id, MatchResult::new(0, 3))
            .await
            .unwrap();
    }

    let after = round(&manager, tid, 2).await;
    for (i, m) in after.iter().enumerate() {
        let second_feeder = &openers[2 * i + 1];
        let first_feeder = &openers[2 * i];
        assert_eq!(m.team1, second_feeder.team2);
        assert_eq!(m.team2, first_feeder.team2);
        assert_eq!(m.state, MatchState::Pending);
        assert_eq!((m.team1_score, m.team2_score), (0, 0));
    }

    // Round 3 is untouched.
    let finals = round(&manager, tid, 3).await;
    assert_eq!(finals[0].team_count(), 0);
}

#[tokio::test]
async fn test_completed_match_records_result() {
    let (manager, tid) = bracket_of(4, TournamentFormat::SingleElimination).await;
    let matches = manager.generate_single_elimination(tid, None).await.unwrap();
    let opener = &matches[0];

    let done = manager
        .report_result(opener.id, MatchResult::new(1, 3))
        .await
        .unwrap();
    assert_eq!(done.winner, opener.team2);
    assert_eq!(done.state, MatchState::Completed);
    assert_eq!(done.loser(), opener.team1);

    let stored = fetch(&manager, opener).await;
    assert_eq!(stored, done);

    assert!(matches!(
        manager.report_result(opener.id, MatchResult::new(3, 1)).await,
        Err(BracketError::MatchAlreadyCompleted(_))
    ));
}

#[tokio::test]
async fn test_elimination_draw_needs_declared_winner() {
    let (manager, tid) = bracket_of(4, TournamentFormat::SingleElimination).await;
    let matches = manager.generate_single_elimination(tid, None).await.unwrap();
    let opener = &matches[0];

    assert!(matches!(
        manager.report_result(opener.id, MatchResult::new(1, 1)).await,
        Err(BracketError::DrawNotAllowed(id)) if id == opener.id
    ));
    assert_eq!(fetch(&manager, opener).await.state, MatchState::Pending);

    let team2 = opener.team2.unwrap();
    let done = manager
        .report_result(opener.id, MatchResult::new(1, 1).with_winner(team2))
        .await
        .unwrap();
    assert_eq!(done.winner, Some(team2));

    let outsider = matches[1].team1.unwrap();
    assert!(matches!(
        manager
            .report_result(matches[1].id, MatchResult::new(0, 0).with_winner(outsider + 100))
            .await,
        Err(BracketError::InvalidWinner { .. })
    ));
}

#[tokio::test]
async fn test_unready_and_unknown_matches() {
    let (manager, tid) = bracket_of(4, TournamentFormat::SingleElimination).await;
    manager.generate_single_elimination(tid, None).await.unwrap();
    let final_match = round(&manager, tid, 2).await.remove(0);

    assert!(matches!(
        manager.report_result(final_match.id, MatchResult::new(1, 0)).await,
        Err(BracketError::MatchNotReady(_))
    ));
    assert!(matches!(
        manager
            .report_result(uuid::Uuid::new_v4(), MatchResult::new(1, 0))
            .await,
        Err(BracketError::MatchNotFound(_))
    ));
}

#[tokio::test]
async fn test_group_draw_is_recorded() {
    let (manager, tid) = bracket_of(4, TournamentFormat::RoundRobin).await;
    let matches = manager.generate_group_stage(tid, 1, None).await.unwrap();
    let m = &matches[0];

    let done = manager
        .report_result(m.id, MatchResult::new(1, 1))
        .await
        .unwrap();
    assert!(done.is_draw());

    let table = manager.standings(tid, MatchPhase::GroupStage).await.unwrap();
    let drawn: Vec<_> = table.iter().filter(|s| s.draws == 1).collect();
    assert_eq!(drawn.len(), 2);
    assert!(drawn.iter().all(|s| s.points == 1));
}

#[tokio::test]
async fn test_reset_cascades_downstream() {
    let (manager, tid) = bracket_of(4, TournamentFormat::SingleElimination).await;
    manager.generate_single_elimination(tid, None).await.unwrap();
    let semis = round(&manager, tid, 1).await;
    for m in &semis {
        manager
            .report_result(m.id, MatchResult::new(2, 0))
            .await
            .unwrap();
    }
    let final_match = round(&manager, tid, 2).await.remove(0);
    manager
        .report_result(final_match.id, MatchResult::new(2, 1))
        .await
        .unwrap();

    let changed = manager.reset_match(semis[0].id).await.unwrap();
    assert_eq!(changed.len(), 2);

    let semi = fetch(&manager, &semis[0]).await;
    assert_eq!(semi.state, MatchState::Pending);
    assert_eq!(semi.winner, None);
    assert_eq!((semi.team1_score, semi.team2_score), (0, 0));
    assert_eq!(semi.team_count(), 2);

    let final_after = fetch(&manager, &final_match).await;
    assert_eq!(final_after.state, MatchState::Pending);
    assert_eq!(final_after.winner, None);
    assert_eq!(final_after.team1, None);
    assert_eq!(final_after.team2, semis[1].team1);

    // Replaying the semi refills the final.
    manager
        .report_result(semi.id, MatchResult::new(0, 2))
        .await
        .unwrap();
    let refilled = fetch(&manager, &final_match).await;
    assert_eq!(refilled.team1, semis[0].team2);

    assert!(matches!(
        manager.reset_match(final_match.id).await,
        Err(BracketError::MatchNotCompleted(_))
    ));
}

#[tokio::test]
async fn test_byes_cannot_be_reset() {
    let (manager, tid) = bracket_of(3, TournamentFormat::SingleElimination).await;
    let matches = manager.generate_single_elimination(tid, None).await.unwrap();
    let bye = matches.iter().find(|m| m.is_bye()).unwrap();

    assert!(matches!(
        manager.reset_match(bye.id).await,
        Err(BracketError::ByeNotResettable(id)) if id == bye.id
    ));
}

#[tokio::test]
async fn test_manual_edits() {
    let (manager, tid) = bracket_of(4, TournamentFormat::SingleElimination).await;
    let matches = manager.generate_single_elimination(tid, None).await.unwrap();
    let (first, second) = (&matches[0], &matches[1]);

    let swapped = manager
        .swap_slots(
            SlotRef::new(first.id, Slot::Two),
            SlotRef::new(second.id, Slot::One),
        )
        .await
        .unwrap();
    assert_eq!(swapped.len(), 2);
    let first_now = fetch(&manager, first).await;
    let second_now = fetch(&manager, second).await;
    assert_eq!(first_now.team2, second.team1);
    assert_eq!(second_now.team1, first.team2);

    let removed = manager
        .remove_team(SlotRef::new(first.id, Slot::One))
        .await
        .unwrap();
    assert_eq!(removed, first.team1);

    assert!(matches!(
        manager
            .assign_team(SlotRef::new(first.id, Slot::Two), removed.unwrap())
            .await,
        Err(BracketError::SlotOccupied(_))
    ));
    let assigned = manager
        .assign_team(SlotRef::new(first.id, Slot::One), removed.unwrap())
        .await
        .unwrap();
    assert_eq!(assigned.team1, first.team1);

    manager
        .report_result(first.id, MatchResult::new(2, 0))
        .await
        .unwrap();
    assert!(matches!(
        manager
            .remove_team(SlotRef::new(first.id, Slot::One))
            .await,
        Err(BracketError::MatchAlreadyCompleted(_))
    ));
    assert!(matches!(
        manager
            .assign_team(SlotRef::new(first.id, Slot::One), 999)
            .await,
        Err(BracketError::TeamNotFound(999))
    ));
}

#[tokio::test]
async fn test_double_elimination_plays_to_a_champion() {
    let (manager, tid) = bracket_of(16, TournamentFormat::GroupsThenDoubleElimination).await;
    manager.generate_group_stage(tid, 4, None).await.unwrap();
    let group_matches = play_out(&manager, tid).await;
    assert_eq!(group_matches, 24);

    manager.generate_double_elimination(tid).await.unwrap();
    let played = play_out(&manager, tid).await;
    assert_eq!(played, 26);

    let playoffs: Vec<Match> = manager
        .bracket(tid, None)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| MatchPhase::PLAYOFFS.contains(&m.phase))
        .collect();
    assert!(playoffs.iter().all(|m| m.is_completed() && m.team_count() == 2));

    // Only the champion never loses. Fourth places start in the lower bracket and
    // go out after one loss; everyone else needs two.
    let mut losses = std::collections::HashMap::new();
    for m in &playoffs {
        *losses.entry(m.loser().unwrap()).or_insert(0) += 1;
    }
    assert!(losses.values().all(|&n| n <= 2));
    assert_eq!(losses.len(), 16 - 1);
    assert_eq!(losses.values().filter(|&&n| n == 1).count(), 4);
    assert_eq!(losses.values().filter(|&&n| n == 2).count(), 11);

    let grand_final = playoffs
        .iter()
        .find(|m| m.phase == MatchPhase::GrandFinals)
        .unwrap();
    assert!(!losses.contains_key(&grand_final.winner.unwrap()));
}

#[tokio::test]
async fn test_upper_losers_drop_into_lower_bracket() {
    let (manager, tid) = bracket_of(16, TournamentFormat::GroupsThenDoubleElimination).await;
    manager.generate_group_stage(tid, 4, None).await.unwrap();
    play_out(&manager, tid).await;
    let matches = manager.generate_double_elimination(tid).await.unwrap();

    let opener = matches
        .iter()
        .find(|m| m.phase == MatchPhase::UpperBracket && m.round == 1)
        .unwrap();
    let done = manager
        .report_result(opener.id, MatchResult::new(0, 2))
        .await
        .unwrap();

    let winner_target = manager
        .store()
        .get_match(opener.next_winner_match.unwrap())
        .await
        .unwrap()
        .unwrap();
    let loser_target = manager
        .store()
        .get_match(opener.next_loser_match.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(winner_target.contains(done.winner.unwrap()));
    assert_eq!(loser_target.phase, MatchPhase::LowerBracket);
    assert!(loser_target.contains(done.loser().unwrap()));
}
