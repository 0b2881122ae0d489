// File: src/core/types.rs
use crate::error::GameError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a registered player.
pub type UserId = i64;

/// ISO `YYYY-MM-DD`, the format used for hashing, storage and display.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, GameError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| GameError::InvalidInput(format!("'{}' is not a YYYY-MM-DD date", raw)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Daily,
    Shot,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Daily => "daily",
            GameMode::Shot => "shot",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(GameMode::Daily),
            "shot" => Ok(GameMode::Shot),
            other => Err(GameError::InvalidInput(format!("unknown game mode '{}'", other))),
        }
    }
}

/// Scopes progress and leaderboards: one game per (date, mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameKey {
    pub date: NaiveDate,
    pub mode: GameMode,
}

impl GameKey {
    pub fn new(date: NaiveDate, mode: GameMode) -> Self {
        Self { date, mode }
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", format_date(self.date), self.mode)
    }
}

/// The word of the day. A pure function of the date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyAssignment {
    pub date: NaiveDate,
    pub word: String,
    pub game_number: u32,
    /// Position of `word` in the curated daily list.
    pub index: usize,
}

/// Public view of the day's game; never reveals the word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyWordInfo {
    pub date: NaiveDate,
    pub word_length: usize,
    pub total_words: usize,
    pub game_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerStats {
    pub vocab_size: usize,
    pub today: NaiveDate,
    pub today_word_length: usize,
    pub game_number: u32,
}

/// Human-facing bucket for a rank. Ordered hottest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    Perfect,
    Scorching,
    VeryHot,
    Hot,
    Warm,
    Cold,
    VeryCold,
    Frozen,
}

/// Inclusive upper rank bound of each tier, checked in order.
const TIERS: [(u32, Temperature); 7] = [
    (1, Temperature::Perfect),
    (10, Temperature::Scorching),
    (50, Temperature::VeryHot),
    (100, Temperature::Hot),
    (500, Temperature::Warm),
    (1000, Temperature::Cold),
    (5000, Temperature::VeryCold),
];

impl Temperature {
    /// Tier for `rank`. Rank 1 is `Perfect` whether or not the guess was the target.
    pub fn from_rank(rank: u32) -> Self {
        TIERS
            .iter()
            .find(|(limit, _)| rank <= *limit)
            .map(|(_, t)| *t)
            .unwrap_or(Temperature::Frozen)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Temperature::Perfect => "🎉 Perfect!",
            Temperature::Scorching => "🔥🔥🔥 Scorching!",
            Temperature::VeryHot => "🔥🔥 Very hot!",
            Temperature::Hot => "🔥 Hot!",
            Temperature::Warm => "🌡️ Warm",
            Temperature::Cold => "❄️ Cold",
            Temperature::VeryCold => "❄️❄️ Very cold",
            Temperature::Frozen => "🧊 Frozen!",
        }
    }
}

/// Result of scoring one guess. Invalid guesses carry no rank or similarity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuessVerdict {
    pub word: String,
    pub valid: bool,
    pub correct: bool,
    pub rank: Option<u32>,
    pub total_words: Option<usize>,
    /// Cosine similarity mapped onto [0, 1].
    pub similarity: Option<f64>,
    pub temperature: Option<Temperature>,
    pub message: Option<String>,
}

impl GuessVerdict {
    pub fn invalid(word: String) -> Self {
        let message = format!("'{}' is not in the vocabulary", word);
        Self {
            word,
            valid: false,
            correct: false,
            rank: None,
            total_words: None,
            similarity: None,
            temperature: None,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hint {
    pub hint_word: Option<String>,
    pub message: String,
}

/// One entry of the "closest words" help view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub word: String,
    pub rank: u32,
    pub similarity: f64,
}

/// An open Shot round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSession {
    pub id: String,
    pub target: String,
    pub clues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundStart {
    pub round_id: String,
    pub clue_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundOutcome {
    pub correct: bool,
    /// Revealed only on a correct guess.
    pub target_word: Option<String>,
    pub message: String,
}

/// Display identity of a player as resolved by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: UserId,
    pub username: String,
    pub avatar_path: Option<String>,
}

/// What a client reports after each guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub best_rank: u32,
    pub attempts: u32,
    pub completed: bool,
    pub won: bool,
}

/// Latest live state of one player in one game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEntry {
    pub player: Player,
    pub best_rank: u32,
    pub attempts: u32,
    pub completed: bool,
    pub won: bool,
    pub hints_used: u32,
    pub updated_at: DateTime<Utc>,
}

/// Durable per-game record owned by the session store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub game_date: NaiveDate,
    pub mode: GameMode,
    pub attempts: u32,
    pub completed: bool,
    pub won: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub hints_used: u32,
}

impl SessionRecord {
    pub fn new(user_id: UserId, key: GameKey) -> Self {
        Self {
            user_id,
            game_date: key.date,
            mode: key.mode,
            attempts: 0,
            completed: false,
            won: false,
            completed_at: None,
            hints_used: 0,
        }
    }

    pub fn key(&self) -> GameKey {
        GameKey::new(self.game_date, self.mode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub username: String,
    pub avatar_path: Option<String>,
    /// Lower is better.
    pub best_rank: u32,
    pub attempts: u32,
    pub completed: bool,
    pub won: bool,
    pub is_friend: bool,
    pub hints_used: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModeTally {
    pub total: u32,
    pub won: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStatistics {
    pub total_games: u32,
    pub games_won: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    /// Mean attempts over won games, one decimal; 0 without wins.
    pub average_attempts: f64,
    pub games_by_mode: BTreeMap<GameMode, ModeTally>,
    pub total_hints: u32,
}

/// A friend's result for one game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendStatus {
    pub user_id: UserId,
    pub username: String,
    pub avatar_path: Option<String>,
    pub played: bool,
    pub completed: bool,
    pub won: bool,
    pub attempts: Option<u32>,
}
