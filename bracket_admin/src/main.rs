//! Operator command line for the bracket engine.
//!
//! Runs one engine operation against PostgreSQL and prints the result as JSON.

mod cli;
mod config;
mod logging;

use std::sync::Arc;

use anyhow::Error;
use bracket_engine::bracket::{BracketManager, BracketResult};
use bracket_engine::config::EngineConfig;
use bracket_engine::db::{Database, EntityStore};
use cli::Command;
use config::AdminConfig;
use log::info;
use pico_args::Arguments;
use serde_json::{Value, json};

const HELP: &str = "\
Administer tournament brackets

USAGE:
  bracket_admin [--db-url URL] COMMAND [OPTIONS]

COMMANDS:
  migrate                                          Apply database migrations
  create-tournament --name N --slots S [--format F]
                                                   F: single_elimination | groups_then_double_elimination
                                                      | round_robin | swiss
  register      --tournament T --name N            Register a team
  single-elim   --tournament T [--size S]          Generate a single elimination bracket
  group-stage   --tournament T --groups G [--best-of N]
                                                   Deal groups and schedule round robins
  double-elim   --tournament T                     Seed the 16-team double elimination bracket
  swiss-round   --tournament T                     Pair the next Swiss round
  start         --match M                          Mark a match as being played
  report        --match M --score1 A --score2 B [--winner TEAM]
                                                   Report a final result
  reset         --match M                          Reset a completed match
  swap          --a M:SLOT --b M:SLOT              Swap two slot occupants
  remove        --slot M:SLOT                      Empty a slot
  assign        --slot M:SLOT --team TEAM          Place a team into an empty slot
  standings     --tournament T [--phase P]         Standings (default phase group_stage)
  groups        --tournament T                     Group stage standings per group
  bracket       --tournament T [--phase P]         List matches

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  RUST_LOG                 Log filter  [default: info,sqlx=warn]
  BRACKET_BEST_OF          Elimination series length  [default: 3]
  GROUP_STAGE_BEST_OF      Group stage series length  [default: 2]
  SWISS_BEST_OF            Swiss series length  [default: 1]
  GRAND_FINAL_BEST_OF      Grand final series length  [default: 5]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let command = Command::parse(pargs)?;

    logging::init();
    let config = AdminConfig::from_env(database_url)?;

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    info!("Database connected");

    let outcome = run(&db, config.engine, command).await;
    db.close().await;

    match outcome {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            log::error!("Command failed: {}", e);
            Err(e)
        }
    }
}

async fn run(db: &Database, engine: EngineConfig, command: Command) -> Result<Value, Error> {
    if command == Command::Migrate {
        db.migrate().await?;
        info!("Migrations applied");
        return Ok(json!({ "migrated": true }));
    }

    let manager = BracketManager::new(Arc::new(db.store()), engine);
    Ok(execute(&manager, command).await?)
}

async fn execute<S: EntityStore>(
    manager: &BracketManager<S>,
    command: Command,
) -> BracketResult<Value> {
    let output = match command {
        Command::Migrate => json!({ "migrated": false }),
        Command::CreateTournament {
            name,
            slots,
            format,
        } => serde_json::to_value(manager.create_tournament(&name, slots, format).await?)?,
        Command::Register { tournament, name } => {
            serde_json::to_value(manager.register_team(tournament, &name).await?)?
        }
        Command::SingleElim { tournament, size } => {
            serde_json::to_value(manager.generate_single_elimination(tournament, size).await?)?
        }
        Command::GroupStage {
            tournament,
            groups,
            format,
        } => serde_json::to_value(
            manager
                .generate_group_stage(tournament, groups, format)
                .await?,
        )?,
        Command::DoubleElim { tournament } => {
            serde_json::to_value(manager.generate_double_elimination(tournament).await?)?
        }
        Command::SwissRound { tournament } => {
            serde_json::to_value(manager.generate_next_swiss_round(tournament).await?)?
        }
        Command::Start { match_id } => serde_json::to_value(manager.start_match(match_id).await?)?,
        Command::Report { match_id, result } => {
            serde_json::to_value(manager.report_result(match_id, result).await?)?
        }
        Command::Reset { match_id } => serde_json::to_value(manager.reset_match(match_id).await?)?,
        Command::Swap { a, b } => serde_json::to_value(manager.swap_slots(a, b).await?)?,
        Command::Remove { at } => json!({ "removed": manager.remove_team(at).await? }),
        Command::Assign { at, team } => serde_json::to_value(manager.assign_team(at, team).await?)?,
        Command::Standings { tournament, phase } => {
            serde_json::to_value(manager.standings(tournament, phase).await?)?
        }
        Command::Groups { tournament } => {
            serde_json::to_value(manager.group_standings(tournament).await?)?
        }
        Command::Bracket { tournament, phase } => {
            serde_json::to_value(manager.bracket(tournament, phase).await?)?
        }
    };
    Ok(output)
}
