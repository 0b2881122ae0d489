// File: src/config.rs
use crate::error::{GameError, GameResult};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Startup configuration. Every field has a default so a partial TOML file works.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// word2vec text file (`cc.it.300.vec`).
    pub model_path: PathBuf,
    /// Binary cache written after the first text load.
    pub model_cache_path: PathBuf,
    /// Maximum number of vectors read from the text model.
    pub vocab_limit: usize,
    pub daily_words_path: PathBuf,
    /// Accepted-language dictionary used to validate guesses.
    pub dictionary_path: PathBuf,
    pub shot_database_path: PathBuf,
    pub database_path: PathBuf,
    /// Game #1 is played on this date.
    pub epoch: NaiveDate,
    pub ranking_cache_capacity: usize,
    pub round_capacity: usize,
    /// Neighbours scanned when picking a hint.
    pub hint_pool: usize,
    /// Hints are drawn from the first N valid neighbours.
    pub hint_choices: usize,
    pub progress_retention_days: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("cc.it.300.vec"),
            model_cache_path: PathBuf::from("fasttext_it.bin"),
            vocab_limit: 200_000,
            daily_words_path: PathBuf::from("1000_parole_italiane_comuni.txt"),
            dictionary_path: PathBuf::from("280000_parole_italiane.txt"),
            shot_database_path: PathBuf::from("shot_words_database.json"),
            database_path: PathBuf::from("hotncold.db"),
            epoch: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap_or_default(),
            ranking_cache_capacity: 100,
            round_capacity: 1000,
            hint_pool: 1000,
            hint_choices: 100,
            progress_retention_days: 7,
        }
    }
}

impl GameConfig {
    /// Loads the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> GameResult<Self> {
        if !path.exists() {
            info!("[config] {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&raw)?;
        info!("[config] Loaded {:?}", path);
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> GameResult<Self> {
        let config: GameConfig = toml::from_str(raw)
            .map_err(|e| GameError::Configuration(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GameResult<()> {
        let limits = [
            ("vocab_limit", self.vocab_limit),
            ("ranking_cache_capacity", self.ranking_cache_capacity),
            ("round_capacity", self.round_capacity),
            ("hint_pool", self.hint_pool),
            ("hint_choices", self.hint_choices),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(GameError::Configuration(format!("{} must be greater than zero", name)));
            }
        }
        if self.progress_retention_days < 0 {
            return Err(GameError::Configuration("progress_retention_days must not be negative".into()));
        }
        Ok(())
    }
}
