// File: src/core/evaluator.rs
use crate::core::ranking::RankingCache;
use crate::core::types::{GuessVerdict, Temperature};
use crate::embedding::{normalize_similarity, EmbeddingProvider};
use crate::error::GameResult;
use crate::lexicon::{normalize_word, Lexicon};
use std::sync::Arc;

/// Scores guesses against a target word. Reads the ranking cache but never
/// records anything itself.
pub struct GuessEvaluator {
    provider: Arc<dyn EmbeddingProvider>,
    lexicon: Lexicon,
    rankings: RankingCache,
}

impl GuessEvaluator {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, lexicon: Lexicon, cache_capacity: usize) -> Self {
        Self { provider, lexicon, rankings: RankingCache::new(cache_capacity) }
    }

    /// A playable word is known to the model and accepted by the language list.
    pub fn is_valid_word(&self, word: &str) -> bool {
        self.provider.contains(word) && self.lexicon.accepts(word)
    }

    pub fn evaluate(&self, target: &str, guess: &str) -> GameResult<GuessVerdict> {
        let word = normalize_word(guess);
        if !self.is_valid_word(&word) {
            return Ok(GuessVerdict::invalid(word));
        }

        let total_words = self.provider.vocab_size();
        if word == target {
            return Ok(GuessVerdict {
                word,
                valid: true,
                correct: true,
                rank: Some(1),
                total_words: Some(total_words),
                similarity: Some(1.0),
                temperature: Some(Temperature::Perfect),
                message: Some("Congratulations! You found the word!".into()),
            });
        }

        let table = self.rankings.rankings_for(self.provider.as_ref(), target)?;
        // The table spans the whole vocabulary; a missing word ranks last.
        let rank = table.rank_of(&word).unwrap_or(total_words as u32);
        let similarity = normalize_similarity(self.provider.similarity(target, &word)?);

        Ok(GuessVerdict {
            word,
            valid: true,
            correct: false,
            rank: Some(rank),
            total_words: Some(total_words),
            similarity: Some(similarity),
            temperature: Some(Temperature::from_rank(rank)),
            message: None,
        })
    }

    pub fn rankings(&self) -> &RankingCache {
        &self.rankings
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }
}
