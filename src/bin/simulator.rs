use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::{Color, Stylize};
use crossterm::terminal::{Clear, ClearType};
use hotcold_core::core::types::{GuessVerdict, Temperature};
use hotcold_core::store::SqliteStore;
use hotcold_core::{GameConfig, GameEngine};
use std::io::{stdin, stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CONFIG_PATH: &str = "hotcold.toml";
const TOP_SHOWN: usize = 10;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(CONFIG_PATH));
    let engine = match boot(&config_path) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("[ERROR] Could not start the game: {}", e);
            std::process::exit(1);
        }
    };
    let date = std::env::args().nth(2);

    let info = match engine.daily_word_info(date.as_deref()) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            std::process::exit(1);
        }
    };

    let mut guesses: Vec<GuessVerdict> = Vec::new();
    let mut last: Option<GuessVerdict> = None;
    let mut note = String::new();

    loop {
        print_ui(&info.date, info.game_number, info.word_length, &guesses, last.as_ref(), &note);
        note.clear();

        let mut input = String::new();
        match stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let cmd = input.trim();

        match cmd {
            "" => {}
            "quit" | "exit" => break,
            "top" => {
                note = format_top(&guesses);
            }
            "hint" => match engine.hint(date.as_deref()) {
                Ok(hint) => note = hint.message,
                Err(e) => note = format!("Hint failed: {}", e),
            },
            word => match engine.guess(word, date.as_deref()) {
                Ok(verdict) => {
                    let solved = verdict.correct;
                    if verdict.valid && !guesses.iter().any(|g| g.word == verdict.word) {
                        guesses.push(verdict.clone());
                    }
                    last = Some(verdict);
                    if solved {
                        print_ui(&info.date, info.game_number, info.word_length, &guesses, last.as_ref(), &note);
                        println!("\n{}", format!("Solved in {} guesses!", guesses.len()).with(Color::Green).bold());
                        return;
                    }
                }
                Err(e) => note = format!("{}", e),
            },
        }
    }

    reveal(&engine, date.as_deref());
}

fn boot(config_path: &Path) -> hotcold_core::GameResult<GameEngine> {
    let config = GameConfig::load(config_path)?;
    // The simulator keeps no history between runs.
    let store = Arc::new(SqliteStore::open_in_memory()?);
    GameEngine::open(config, store)
}

fn reveal(engine: &GameEngine, date: Option<&str>) {
    match engine.daily_assignment(date) {
        Ok(assignment) => println!("\nThe word was '{}'.", assignment.word.as_str().with(Color::Yellow).bold()),
        Err(e) => eprintln!("[ERROR] {}", e),
    }
    if let Ok(closest) = engine.closest_words(date, TOP_SHOWN) {
        println!("Closest words:");
        for n in closest {
            println!("  {:>3}. {} ({:.2}%)", n.rank, n.word, n.similarity * 100.0);
        }
    }
}

fn temperature_color(t: Temperature) -> Color {
    match t {
        Temperature::Perfect => Color::Green,
        Temperature::Scorching | Temperature::VeryHot => Color::Red,
        Temperature::Hot => Color::DarkRed,
        Temperature::Warm => Color::Yellow,
        Temperature::Cold => Color::Cyan,
        Temperature::VeryCold | Temperature::Frozen => Color::Blue,
    }
}

fn format_verdict(v: &GuessVerdict) -> String {
    match (v.rank, v.temperature) {
        (Some(rank), Some(t)) => {
            let line = format!(
                "{:<16} #{:<7} {:>6.2}%  {}",
                v.word,
                rank,
                v.similarity.unwrap_or(0.0) * 100.0,
                t.label()
            );
            format!("{}", line.with(temperature_color(t)))
        }
        _ => format!("{}", v.message.clone().unwrap_or_default().with(Color::DarkGrey)),
    }
}

fn format_top(guesses: &[GuessVerdict]) -> String {
    if guesses.is_empty() {
        return "No guesses yet.".into();
    }
    let mut sorted: Vec<&GuessVerdict> = guesses.iter().collect();
    sorted.sort_by_key(|g| g.rank.unwrap_or(u32::MAX));
    let mut out = String::from("Best guesses so far:");
    for g in sorted.into_iter().take(TOP_SHOWN) {
        out.push_str("\n  ");
        out.push_str(&format_verdict(g));
    }
    out
}

fn print_ui(
    date: &chrono::NaiveDate,
    game_number: u32,
    word_length: usize,
    guesses: &[GuessVerdict],
    last: Option<&GuessVerdict>,
    note: &str,
) {
    let mut out = stdout();
    let _ = execute!(out, Clear(ClearType::All), MoveTo(0, 0));
    println!("{}", format!("Hot and Cold #{} ({})", game_number, date).bold());
    println!("---------------------------------------------------------------");
    println!("Guess the {}-letter word. 'top' best guesses, 'hint', 'quit' to reveal.\n", word_length);

    println!("Guesses: {}", guesses.len());
    if let Some(v) = last {
        println!("\nLast guess:\n  {}", format_verdict(v));
    }
    if !note.is_empty() {
        println!("\n{}", note);
    }
    print!("\n> ");
    let _ = out.flush();
}
