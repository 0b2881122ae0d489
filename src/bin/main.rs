use hotcold_core::core::types::{GameMode, Player, ProgressUpdate};
use hotcold_core::store::{IdentityResolver, SqliteStore};
use hotcold_core::{GameConfig, GameEngine, GameError, GameResult};
use log::{error, info};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CONFIG_PATH: &str = "hotcold.toml";
const DEFAULT_CLOSEST: usize = 5;

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(CONFIG_PATH));
    let (engine, store) = match boot(&config_path) {
        Ok(booted) => booted,
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };
    info!("--- Hot and Cold engine ready, reading commands ---");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let input = line?;
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some(command) = parts.first().map(|c| c.to_ascii_uppercase()) else { continue };
        if command == "EXIT" {
            info!("Received EXIT, shutting down.");
            break;
        }

        let reply = match dispatch(&engine, &store, &command, &parts[1..]) {
            Ok(value) => json!({ "ok": value }),
            Err(e) => json!({ "error": { "kind": e.kind(), "message": e.to_string() } }),
        };
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }
    Ok(())
}

fn boot(config_path: &Path) -> GameResult<(GameEngine, Arc<SqliteStore>)> {
    let config = GameConfig::load(config_path)?;
    let store = Arc::new(SqliteStore::open(&config.database_path)?);
    let engine = GameEngine::open(config, store.clone())?;
    Ok((engine, store))
}

fn dispatch(engine: &GameEngine, store: &SqliteStore, command: &str, args: &[&str]) -> GameResult<Value> {
    match command {
        "INFO" => to_json(engine.daily_word_info(date_arg(args, 0))?),
        "STATS" => to_json(engine.server_stats()),
        "REVEAL" => to_json(engine.daily_assignment(date_arg(args, 0))?),
        "GUESS" => to_json(engine.guess(arg(args, 0, "word")?, date_arg(args, 1))?),
        "HINT" => to_json(engine.hint(date_arg(args, 0))?),
        "CLOSEST" => {
            let top_n = match args.get(1) {
                Some(n) => n.parse().map_err(|_| GameError::InvalidInput(format!("'{}' is not a count", n)))?,
                None => DEFAULT_CLOSEST,
            };
            to_json(engine.closest_words(date_arg(args, 0), top_n)?)
        }
        "SHOT_NEW" => to_json(engine.start_round()?),
        "SHOT_GUESS" => to_json(engine.resolve_round(arg(args, 0, "round id")?, arg(args, 1, "guess")?)?),
        "REGISTER" => to_json(store.register_player(arg(args, 0, "username")?, args.get(1).copied())?),
        "PROGRESS" => {
            let player = player_arg(store, args, 0)?;
            let update = ProgressUpdate {
                best_rank: number_arg(args, 3, "best_rank")?,
                attempts: number_arg(args, 4, "attempts")?,
                completed: bool_arg(args, 5, "completed")?,
                won: bool_arg(args, 6, "won")?,
            };
            let mode = mode_arg(args, 2)?;
            to_json(engine.record_progress(&player, arg(args, 1, "date")?, mode, update)?)
        }
        "USE_HINT" => {
            let player = player_arg(store, args, 0)?;
            let used = engine.record_hint(&player, arg(args, 1, "date")?, mode_arg(args, 2)?)?;
            Ok(json!({ "hints_used": used }))
        }
        "PLAYERS" => {
            let viewer: Option<Player> = args.get(2).and_then(|name| store.resolve(name));
            let friends_only = args.get(3).map(|raw| parse_bool(raw, "friends_only")).transpose()?.unwrap_or(false);
            let board = engine.leaderboard(arg(args, 0, "date")?, mode_arg(args, 1)?, viewer.as_ref(), friends_only)?;
            to_json(board)
        }
        "USER_STATS" => to_json(engine.user_statistics(player_arg(store, args, 0)?.id)?),
        "HISTORY" => to_json(engine.history(player_arg(store, args, 0)?.id)?),
        "FRIENDS" => {
            let player = player_arg(store, args, 0)?;
            to_json(engine.friends_status(player.id, arg(args, 1, "date")?, mode_arg(args, 2)?)?)
        }
        other => Err(GameError::InvalidInput(format!("unknown command '{}'", other))),
    }
}

fn to_json<T: Serialize>(value: T) -> GameResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn arg<'a>(args: &[&'a str], index: usize, name: &str) -> GameResult<&'a str> {
    args.get(index).copied().ok_or_else(|| GameError::InvalidInput(format!("missing {}", name)))
}

/// Optional date; absent or "-" means today.
fn date_arg<'a>(args: &[&'a str], index: usize) -> Option<&'a str> {
    args.get(index).copied().filter(|d| *d != "-")
}

fn mode_arg(args: &[&str], index: usize) -> GameResult<GameMode> {
    args.get(index).map_or(Ok(GameMode::Daily), |raw| raw.parse())
}

fn number_arg(args: &[&str], index: usize, name: &str) -> GameResult<u32> {
    let raw = arg(args, index, name)?;
    raw.parse().map_err(|_| GameError::InvalidInput(format!("{} must be a non-negative number, got '{}'", name, raw)))
}

fn bool_arg(args: &[&str], index: usize, name: &str) -> GameResult<bool> {
    parse_bool(arg(args, index, name)?, name)
}

fn parse_bool(raw: &str, name: &str) -> GameResult<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(GameError::InvalidInput(format!("{} must be true or false, got '{}'", name, raw))),
    }
}

fn player_arg(store: &SqliteStore, args: &[&str], index: usize) -> GameResult<Player> {
    let name = arg(args, index, "username")?;
    store.resolve(name).ok_or_else(|| GameError::InvalidInput(format!("no current user for '{}'", name)))
}
