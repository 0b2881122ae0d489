// File: src/core/rounds.rs
use crate::core::types::{RoundOutcome, RoundSession, RoundStart};
use crate::error::{GameError, GameResult};
use crate::lexicon::{normalize_word, ShotEntry};
use log::info;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

#[derive(Default)]
struct OpenRounds {
    by_id: HashMap<String, RoundSession>,
    /// Insertion order, oldest first. Holds exactly the ids in `by_id`.
    order: VecDeque<String>,
}

impl OpenRounds {
    fn remove(&mut self, id: &str) -> Option<RoundSession> {
        let round = self.by_id.remove(id)?;
        self.order.retain(|open| open != id);
        Some(round)
    }
}

/// Open Shot rounds keyed by an opaque id. At most `capacity` rounds are kept;
/// starting one more evicts the oldest. Solved or evicted ids never come back.
pub struct RoundStore {
    entries: Vec<ShotEntry>,
    capacity: usize,
    open: Mutex<OpenRounds>,
}

impl RoundStore {
    pub fn new(entries: Vec<ShotEntry>, capacity: usize) -> GameResult<Self> {
        if entries.is_empty() {
            return Err(GameError::Configuration("the Shot word database is empty".into()));
        }
        if capacity == 0 {
            return Err(GameError::Configuration("round capacity must be greater than zero".into()));
        }
        Ok(Self { entries, capacity, open: Mutex::new(OpenRounds::default()) })
    }

    pub fn start_round(&self) -> GameResult<RoundStart> {
        let entry = self
            .entries
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| GameError::Configuration("the Shot word database is empty".into()))?;

        let round = RoundSession {
            id: Uuid::new_v4().to_string(),
            target: normalize_word(&entry.target),
            clues: entry.clues.iter().map(|c| c.trim().to_uppercase()).collect(),
        };
        let start = RoundStart { round_id: round.id.clone(), clue_words: round.clues.clone() };

        let mut open = self.open.lock();
        while open.by_id.len() >= self.capacity {
            let Some(oldest) = open.order.pop_front() else { break };
            open.by_id.remove(&oldest);
            info!("[shot] Evicted round {} (capacity {})", oldest, self.capacity);
        }
        open.order.push_back(round.id.clone());
        open.by_id.insert(round.id.clone(), round);
        drop(open);

        info!("[shot] Started round {}", start.round_id);
        Ok(start)
    }

    /// Checks a guess. A correct guess closes the round; a wrong one leaves it open.
    pub fn resolve_guess(&self, round_id: &str, guess: &str) -> GameResult<RoundOutcome> {
        let guess = normalize_word(guess);
        if guess.is_empty() {
            return Err(GameError::InvalidInput("guess must not be empty".into()));
        }

        let mut open = self.open.lock();
        let target = match open.by_id.get(round_id) {
            Some(round) => round.target.clone(),
            None => return Err(GameError::RoundNotFound(round_id.to_string())),
        };

        if guess != target {
            return Ok(RoundOutcome {
                correct: false,
                target_word: None,
                message: "That is not the word.".into(),
            });
        }

        open.remove(round_id);
        drop(open);
        info!("[shot] Round {} solved", round_id);
        Ok(RoundOutcome {
            correct: true,
            target_word: Some(target),
            message: "You got it! 🎉".into(),
        })
    }

    pub fn open_rounds(&self) -> usize {
        self.open.lock().by_id.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
