// File: src/lexicon.rs
use crate::embedding::EmbeddingProvider;
use crate::error::{GameError, GameResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const FALLBACK_SCAN: usize = 50_000;
const FALLBACK_WORDS: usize = 1000;

/// Normalises a user-supplied word the same way everywhere.
pub fn normalize_word(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// One word per line, trimmed and lower-cased; blank lines are skipped.
pub fn parse_word_list(raw: &str) -> Vec<String> {
    raw.lines().map(normalize_word).filter(|w| !w.is_empty()).collect()
}

pub fn load_word_list(path: &Path) -> GameResult<Vec<String>> {
    Ok(parse_word_list(&fs::read_to_string(path)?))
}

/// The accepted-language word list. It rejects tokens the embedding model
/// knows but that are not words of the language (loanwords, names, noise).
/// An empty lexicon accepts everything.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    words: HashSet<String>,
}

impl Lexicon {
    pub fn new<I: IntoIterator<Item = String>>(words: I) -> Self {
        Self { words: words.into_iter().collect() }
    }

    /// Loads the dictionary; a missing file disables the filter with a warning.
    pub fn load_or_permissive(path: &Path) -> GameResult<Self> {
        if !path.exists() {
            warn!("[lexicon] Dictionary {:?} not found, guesses will not be language-checked", path);
            return Ok(Self::default());
        }
        let lexicon = Self::new(load_word_list(path)?);
        info!("[lexicon] Loaded {} accepted words", lexicon.len());
        Ok(lexicon)
    }

    pub fn accepts(&self, word: &str) -> bool {
        self.words.is_empty() || self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Curated daily targets. Words missing from the model are dropped; when the
/// file is absent a list is derived from the head of the vocabulary.
pub fn load_daily_words(
    path: &Path,
    provider: &dyn EmbeddingProvider,
    lexicon: &Lexicon,
) -> GameResult<Vec<String>> {
    let words = if path.exists() {
        let listed = load_word_list(path)?;
        let total = listed.len();
        let kept: Vec<String> = listed.into_iter().filter(|w| provider.contains(w)).collect();
        if kept.len() < total {
            warn!("[lexicon] Dropped {} daily words missing from the model", total - kept.len());
        }
        kept
    } else {
        warn!("[lexicon] Daily word list {:?} not found, deriving one from the vocabulary", path);
        derive_daily_words(provider, lexicon)
    };

    if words.is_empty() {
        return Err(GameError::Configuration("the daily word list is empty".into()));
    }
    info!("[lexicon] {} daily words available", words.len());
    Ok(words)
}

/// Frequent, plain-alphabetic, mid-length vocabulary entries the lexicon accepts.
pub fn derive_daily_words(provider: &dyn EmbeddingProvider, lexicon: &Lexicon) -> Vec<String> {
    provider
        .words()
        .iter()
        .take(FALLBACK_SCAN)
        .filter(|w| (4..=12).contains(&w.chars().count()))
        .filter(|w| w.chars().all(char::is_alphabetic))
        .filter(|w| lexicon.accepts(w))
        .take(FALLBACK_WORDS)
        .cloned()
        .collect()
}

/// A Shot puzzle: a hidden target and the clue words shown to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotEntry {
    pub target: String,
    pub clues: Vec<String>,
}

pub fn parse_shot_database(raw: &str) -> GameResult<Vec<ShotEntry>> {
    let entries: Vec<ShotEntry> = serde_json::from_str(raw)?;
    let entries: Vec<ShotEntry> = entries
        .into_iter()
        .map(|e| ShotEntry { target: normalize_word(&e.target), clues: e.clues })
        .filter(|e| !e.target.is_empty())
        .collect();
    if entries.is_empty() {
        return Err(GameError::Configuration("the Shot word database is empty".into()));
    }
    Ok(entries)
}

pub fn load_shot_database(path: &Path) -> GameResult<Vec<ShotEntry>> {
    if !path.exists() {
        return Err(GameError::Configuration(format!("Shot word database not found: {:?}", path)));
    }
    let entries = parse_shot_database(&fs::read_to_string(path)?)?;
    info!("[lexicon] Loaded {} Shot entries", entries.len());
    Ok(entries)
}
