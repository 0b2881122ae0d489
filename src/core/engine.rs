// File: src/core/engine.rs
use crate::config::GameConfig;
use crate::core::evaluator::GuessEvaluator;
use crate::core::progress::ProgressAggregator;
use crate::core::rounds::RoundStore;
use crate::core::scheduler::WordScheduler;
use crate::core::types::{
    parse_date, DailyAssignment, DailyWordInfo, FriendStatus, GameKey, GameMode, GuessVerdict, Hint,
    LeaderboardEntry, Neighbor, Player, ProgressEntry, ProgressUpdate, RoundOutcome, RoundStart, ServerStats,
    SessionRecord, UserId, UserStatistics,
};
use crate::embedding::{normalize_similarity, EmbeddingProvider};
use crate::error::{GameError, GameResult};
use crate::lexicon::{load_daily_words, load_shot_database, normalize_word, Lexicon, ShotEntry};
use crate::persistence::load_or_build_model;
use crate::store::SessionStore;
use chrono::NaiveDate;
use log::{info, warn};
use rand::seq::SliceRandom;
use std::sync::Arc;

// The game engine owns every piece of shared state; nothing lives in globals.
pub struct GameEngine {
    config: GameConfig,
    scheduler: WordScheduler,
    evaluator: GuessEvaluator,
    rounds: RoundStore,
    progress: ProgressAggregator,
}

impl GameEngine {
    pub fn new(
        config: GameConfig,
        provider: Arc<dyn EmbeddingProvider>,
        lexicon: Lexicon,
        daily_words: Vec<String>,
        shot_entries: Vec<ShotEntry>,
        store: Arc<dyn SessionStore>,
    ) -> GameResult<Self> {
        config.validate()?;

        let listed = daily_words.len();
        let daily_words: Vec<String> = daily_words
            .into_iter()
            .map(|w| normalize_word(&w))
            .filter(|w| provider.contains(w))
            .collect();
        if daily_words.len() < listed {
            warn!("[engine] {} daily words are not in the model and were skipped", listed - daily_words.len());
        }

        let scheduler = WordScheduler::new(daily_words, config.epoch)?;
        let rounds = RoundStore::new(shot_entries, config.round_capacity)?;
        let progress = ProgressAggregator::new(store, config.progress_retention_days);
        let evaluator = GuessEvaluator::new(provider, lexicon, config.ranking_cache_capacity);

        Ok(Self { config, scheduler, evaluator, rounds, progress })
    }

    /// Loads the model, word lists and Shot database named by `config`.
    pub fn open(config: GameConfig, store: Arc<dyn SessionStore>) -> GameResult<Self> {
        let model = load_or_build_model(&config.model_path, &config.model_cache_path, config.vocab_limit)?;
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(model);
        let lexicon = Lexicon::load_or_permissive(&config.dictionary_path)?;
        let daily_words = load_daily_words(&config.daily_words_path, provider.as_ref(), &lexicon)?;
        let shot_entries = load_shot_database(&config.shot_database_path)?;

        let engine = Self::new(config, provider, lexicon, daily_words, shot_entries, store)?;
        info!(
            "[engine] Ready: {} words in the model, {} daily words",
            engine.evaluator.provider().vocab_size(),
            engine.scheduler.len()
        );
        Ok(engine)
    }

    /// `None` means today (UTC).
    pub fn resolve_date(date: Option<&str>) -> GameResult<NaiveDate> {
        match date {
            Some(raw) if !raw.trim().is_empty() => parse_date(raw),
            _ => Ok(WordScheduler::today()),
        }
    }

    pub fn daily_assignment(&self, date: Option<&str>) -> GameResult<DailyAssignment> {
        Ok(self.scheduler.assignment_for_date(Self::resolve_date(date)?))
    }

    pub fn daily_word_info(&self, date: Option<&str>) -> GameResult<DailyWordInfo> {
        let assignment = self.daily_assignment(date)?;
        Ok(DailyWordInfo {
            date: assignment.date,
            word_length: assignment.word.chars().count(),
            total_words: self.evaluator.provider().vocab_size(),
            game_number: assignment.game_number,
        })
    }

    pub fn server_stats(&self) -> ServerStats {
        let today = self.scheduler.assignment_for_date(WordScheduler::today());
        ServerStats {
            vocab_size: self.evaluator.provider().vocab_size(),
            today: today.date,
            today_word_length: today.word.chars().count(),
            game_number: today.game_number,
        }
    }

    pub fn guess(&self, word: &str, date: Option<&str>) -> GameResult<GuessVerdict> {
        if word.trim().is_empty() {
            return Err(GameError::InvalidInput("guess must not be empty".into()));
        }
        let assignment = self.daily_assignment(date)?;
        self.evaluator.evaluate(&assignment.word, word)
    }

    /// A random playable word from near the top of the day's neighbour list.
    pub fn hint(&self, date: Option<&str>) -> GameResult<Hint> {
        let target = self.daily_assignment(date)?.word;
        let neighbours = self.evaluator.provider().nearest_neighbors(&target, self.config.hint_pool)?;
        let candidates: Vec<String> = neighbours
            .into_iter()
            .map(|(word, _)| word)
            .filter(|w| *w != target && self.evaluator.is_valid_word(w))
            .take(self.config.hint_choices)
            .collect();

        Ok(match candidates.choose(&mut rand::thread_rng()) {
            Some(word) => Hint {
                hint_word: Some(word.clone()),
                message: format!("💡 Hint: try words close to '{}'", word),
            },
            None => Hint { hint_word: None, message: "No hint is available right now.".into() },
        })
    }

    /// The `top_n` nearest neighbours of the day's word, for help and debugging.
    pub fn closest_words(&self, date: Option<&str>, top_n: usize) -> GameResult<Vec<Neighbor>> {
        if top_n == 0 {
            return Err(GameError::InvalidInput("top_n must be at least 1".into()));
        }
        let target = self.daily_assignment(date)?.word;
        let neighbours = self.evaluator.provider().nearest_neighbors(&target, top_n)?;
        Ok(neighbours
            .into_iter()
            .enumerate()
            .map(|(i, (word, raw))| Neighbor { word, rank: i as u32 + 1, similarity: normalize_similarity(raw) })
            .collect())
    }

    pub fn start_round(&self) -> GameResult<RoundStart> {
        self.rounds.start_round()
    }

    pub fn resolve_round(&self, round_id: &str, guess: &str) -> GameResult<RoundOutcome> {
        if round_id.trim().is_empty() {
            return Err(GameError::InvalidInput("round id must not be empty".into()));
        }
        self.rounds.resolve_guess(round_id.trim(), guess)
    }

    pub fn record_progress(
        &self,
        player: &Player,
        date: &str,
        mode: GameMode,
        update: ProgressUpdate,
    ) -> GameResult<ProgressEntry> {
        self.progress.record_progress(GameKey::new(parse_date(date)?, mode), player, update)
    }

    pub fn record_hint(&self, player: &Player, date: &str, mode: GameMode) -> GameResult<u32> {
        self.progress.record_hint(GameKey::new(parse_date(date)?, mode), player)
    }

    pub fn leaderboard(
        &self,
        date: &str,
        mode: GameMode,
        viewer: Option<&Player>,
        friends_only: bool,
    ) -> GameResult<Vec<LeaderboardEntry>> {
        self.progress.leaderboard(GameKey::new(parse_date(date)?, mode), viewer, friends_only)
    }

    pub fn user_statistics(&self, user_id: UserId) -> GameResult<UserStatistics> {
        self.progress.user_statistics(user_id)
    }

    pub fn history(&self, user_id: UserId) -> GameResult<Vec<SessionRecord>> {
        self.progress.history(user_id)
    }

    pub fn friends_status(&self, user_id: UserId, date: &str, mode: GameMode) -> GameResult<Vec<FriendStatus>> {
        self.progress.friends_status(user_id, GameKey::new(parse_date(date)?, mode))
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &GuessEvaluator {
        &self.evaluator
    }

    pub fn rounds(&self) -> &RoundStore {
        &self.rounds
    }

    pub fn progress(&self) -> &ProgressAggregator {
        &self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::sample_model;
    use crate::store::SqliteStore;

    fn engine(daily: &[&str]) -> GameEngine {
        let lexicon = Lexicon::new(
            ["mare", "oceano", "spiaggia", "onda", "montagna", "neve", "fuoco"].map(String::from),
        );
        let shots = vec![ShotEntry { target: "neve".into(), clues: vec!["bianco".into(), "freddo".into()] }];
        GameEngine::new(
            GameConfig::default(),
            Arc::new(sample_model()),
            lexicon,
            daily.iter().map(|w| w.to_string()).collect(),
            shots,
            Arc::new(SqliteStore::open_in_memory().unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn daily_words_outside_the_model_are_skipped() {
        let e = engine(&["zzzz", "MARE"]);
        assert_eq!(e.daily_assignment(Some("2025-12-01")).unwrap().word, "mare");
        let err = GameEngine::new(
            GameConfig::default(),
            Arc::new(sample_model()),
            Lexicon::default(),
            vec!["zzzz".into()],
            vec![ShotEntry { target: "neve".into(), clues: vec![] }],
            Arc::new(SqliteStore::open_in_memory().unwrap()),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn info_does_not_reveal_the_word() {
        let e = engine(&["mare"]);
        let info = e.daily_word_info(Some("2025-11-10")).unwrap();
        assert_eq!(info.word_length, 4);
        assert_eq!(info.total_words, 8);
        assert_eq!(info.game_number, 10);
    }

    #[test]
    fn guesses_score_against_the_day_word() {
        let e = engine(&["mare"]);
        let verdict = e.guess("oceano", Some("2025-11-10")).unwrap();
        assert_eq!(verdict.rank, Some(1));
        assert!(e.guess("mare", None).unwrap().correct);
        assert_eq!(e.guess("  ", None).unwrap_err().kind(), "invalid_input");
        assert_eq!(e.guess("mare", Some("yesterday")).unwrap_err().kind(), "invalid_input");
    }

    #[test]
    fn hints_are_valid_non_target_neighbours() {
        let e = engine(&["mare"]);
        for _ in 0..20 {
            let hint = e.hint(Some("2025-11-10")).unwrap();
            let word = hint.hint_word.unwrap();
            assert_ne!(word, "mare");
            assert_ne!(word, "weekend");
            assert!(e.evaluator().is_valid_word(&word));
        }
    }

    #[test]
    fn closest_words_are_ranked() {
        let e = engine(&["mare"]);
        let closest = e.closest_words(Some("2025-11-10"), 3).unwrap();
        let words: Vec<&str> = closest.iter().map(|n| n.word.as_str()).collect();
        assert_eq!(words, vec!["oceano", "spiaggia", "onda"]);
        assert_eq!(closest[2].rank, 3);
        assert!(closest[0].similarity > closest[1].similarity);
        assert!(e.closest_words(None, 0).is_err());
    }

    #[test]
    fn shot_rounds_go_through_the_engine() {
        let e = engine(&["mare"]);
        let start = e.start_round().unwrap();
        assert_eq!(start.clue_words, vec!["BIANCO", "FREDDO"]);
        assert!(!e.resolve_round(&start.round_id, "mare").unwrap().correct);
        assert!(e.resolve_round(&start.round_id, "Neve").unwrap().correct);
        assert_eq!(e.resolve_round(&start.round_id, "neve").unwrap_err().kind(), "round_not_found");
        assert_eq!(e.resolve_round(" ", "neve").unwrap_err().kind(), "invalid_input");
    }
}
