// File: src/core/scheduler.rs
use crate::core::types::{format_date, DailyAssignment};
use crate::error::{GameError, GameResult};
use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};

/// Maps a calendar date onto a curated target word and a game number.
/// Holds no mutable state: the same date always yields the same assignment.
pub struct WordScheduler {
    words: Vec<String>,
    epoch: NaiveDate,
}

impl WordScheduler {
    pub fn new(words: Vec<String>, epoch: NaiveDate) -> GameResult<Self> {
        if words.is_empty() {
            return Err(GameError::Configuration("cannot schedule from an empty word list".into()));
        }
        Ok(Self { words, epoch })
    }

    pub fn assignment_for_date(&self, date: NaiveDate) -> DailyAssignment {
        let index = self.word_index(date);
        DailyAssignment {
            date,
            word: self.words[index].clone(),
            game_number: self.game_number(date),
            index,
        }
    }

    /// Days since the epoch plus one, never below 1.
    pub fn game_number(&self, date: NaiveDate) -> u32 {
        let delta = (date - self.epoch).num_days() + 1;
        delta.clamp(1, u32::MAX as i64) as u32
    }

    /// Leading 128 bits of the digest of the ISO date, reduced modulo the list size.
    fn word_index(&self, date: NaiveDate) -> usize {
        let digest = Sha256::digest(format_date(date).as_bytes());
        let mut head = [0u8; 16];
        head.copy_from_slice(&digest[..16]);
        (u128::from_be_bytes(head) % self.words.len() as u128) as usize
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }
}
