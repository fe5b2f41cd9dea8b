//! Command line parsing.

use bracket_engine::bracket::{MatchPhase, MatchResult, Slot, SlotRef, TournamentFormat};
use bracket_engine::{MatchFormat, MatchId, TeamId, TournamentId};
use pico_args::Arguments;
use std::ffi::OsString;
use thiserror::Error;
use uuid::Uuid;

/// One engine operation per invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Migrate,
    CreateTournament {
        name: String,
        slots: usize,
        format: TournamentFormat,
    },
    Register {
        tournament: TournamentId,
        name: String,
    },
    SingleElim {
        tournament: TournamentId,
        size: Option<usize>,
    },
    GroupStage {
        tournament: TournamentId,
        groups: usize,
        format: Option<MatchFormat>,
    },
    DoubleElim {
        tournament: TournamentId,
    },
    SwissRound {
        tournament: TournamentId,
    },
    Start {
        match_id: MatchId,
    },
    Report {
        match_id: MatchId,
        result: MatchResult,
    },
    Reset {
        match_id: MatchId,
    },
    Swap {
        a: SlotRef,
        b: SlotRef,
    },
    Remove {
        at: SlotRef,
    },
    Assign {
        at: SlotRef,
        team: TeamId,
    },
    Standings {
        tournament: TournamentId,
        phase: MatchPhase,
    },
    Groups {
        tournament: TournamentId,
    },
    Bracket {
        tournament: TournamentId,
        phase: Option<MatchPhase>,
    },
}

/// Command line errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Args(#[from] pico_args::Error),

    #[error("No command given, see --help")]
    MissingCommand,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unexpected arguments: {0:?}")]
    Unused(Vec<OsString>),
}

impl Command {
    /// Parse the subcommand and its options. Every argument must be consumed.
    pub fn parse(mut pargs: Arguments) -> Result<Self, CliError> {
        let name = pargs.subcommand()?.ok_or(CliError::MissingCommand)?;

        let command = match name.as_str() {
            "migrate" => Command::Migrate,
            "create-tournament" => Command::CreateTournament {
                name: pargs.value_from_str("--name")?,
                slots: pargs.value_from_str("--slots")?,
                format: pargs
                    .opt_value_from_fn("--format", parse_format)?
                    .unwrap_or(TournamentFormat::SingleElimination),
            },
            "register" => Command::Register {
                tournament: pargs.value_from_str("--tournament")?,
                name: pargs.value_from_str("--name")?,
            },
            "single-elim" => Command::SingleElim {
                tournament: pargs.value_from_str("--tournament")?,
                size: pargs.opt_value_from_str("--size")?,
            },
            "group-stage" => Command::GroupStage {
                tournament: pargs.value_from_str("--tournament")?,
                groups: pargs.value_from_str("--groups")?,
                format: pargs
                    .opt_value_from_str::<_, u8>("--best-of")?
                    .map(MatchFormat::best_of),
            },
            "double-elim" => Command::DoubleElim {
                tournament: pargs.value_from_str("--tournament")?,
            },
            "swiss-round" => Command::SwissRound {
                tournament: pargs.value_from_str("--tournament")?,
            },
            "start" => Command::Start {
                match_id: pargs.value_from_fn("--match", parse_match_id)?,
            },
            "report" => {
                let match_id = pargs.value_from_fn("--match", parse_match_id)?;
                let mut result = MatchResult::new(
                    pargs.value_from_str("--score1")?,
                    pargs.value_from_str("--score2")?,
                );
                if let Some(winner) = pargs.opt_value_from_str("--winner")? {
                    result = result.with_winner(winner);
                }
                Command::Report { match_id, result }
            }
            "reset" => Command::Reset {
                match_id: pargs.value_from_fn("--match", parse_match_id)?,
            },
            "swap" => Command::Swap {
                a: pargs.value_from_fn("--a", parse_slot_ref)?,
                b: pargs.value_from_fn("--b", parse_slot_ref)?,
            },
            "remove" => Command::Remove {
                at: pargs.value_from_fn("--slot", parse_slot_ref)?,
            },
            "assign" => Command::Assign {
                at: pargs.value_from_fn("--slot", parse_slot_ref)?,
                team: pargs.value_from_str("--team")?,
            },
            "standings" => Command::Standings {
                tournament: pargs.value_from_str("--tournament")?,
                phase: pargs
                    .opt_value_from_fn("--phase", parse_phase)?
                    .unwrap_or(MatchPhase::GroupStage),
            },
            "groups" => Command::Groups {
                tournament: pargs.value_from_str("--tournament")?,
            },
            "bracket" => Command::Bracket {
                tournament: pargs.value_from_str("--tournament")?,
                phase: pargs.opt_value_from_fn("--phase", parse_phase)?,
            },
            other => return Err(CliError::UnknownCommand(other.to_string())),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(CliError::Unused(remaining));
        }
        Ok(command)
    }
}

fn parse_match_id(value: &str) -> Result<MatchId, String> {
    Uuid::parse_str(value).map_err(|e| format!("invalid match id '{value}': {e}"))
}

fn parse_phase(value: &str) -> Result<MatchPhase, String> {
    MatchPhase::parse(value).ok_or_else(|| format!("unknown phase '{value}'"))
}

fn parse_format(value: &str) -> Result<TournamentFormat, String> {
    TournamentFormat::parse(value).ok_or_else(|| format!("unknown tournament format '{value}'"))
}

/// `MATCH_ID:1` or `MATCH_ID:2`
fn parse_slot_ref(value: &str) -> Result<SlotRef, String> {
    let (id, slot) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected MATCH_ID:SLOT, got '{value}'"))?;
    let slot = match slot {
        "1" => Slot::One,
        "2" => Slot::Two,
        other => return Err(format!("slot must be 1 or 2, got '{other}'")),
    };
    Ok(SlotRef::new(parse_match_id(id)?, slot))
}
