use hotcold_core::core::types::{GameMode, ProgressUpdate, Temperature};
use hotcold_core::embedding::VectorModel;
use hotcold_core::lexicon::{Lexicon, ShotEntry};
use hotcold_core::store::{FriendshipStatus, SqliteStore};
use hotcold_core::{GameConfig, GameEngine};
use std::fs;
use std::sync::Arc;

/// 2-d unit vector at `degrees` from the x axis.
fn at(degrees: f32) -> Vec<f32> {
    let r = degrees.to_radians();
    vec![r.cos(), r.sin()]
}

// "sole" sits on the x axis; every other word is further away in angle order.
const WORDS: [(&str, f32); 8] = [
    ("sole", 0.0),
    ("luce", 10.0),
    ("caldo", 20.0),
    ("estate", 40.0),
    ("spiaggia", 60.0),
    ("nuvola", 120.0),
    ("pioggia", 150.0),
    ("notte", 180.0),
];

fn model() -> VectorModel {
    VectorModel::from_vectors(WORDS.iter().map(|(w, deg)| (*w, at(*deg)))).expect("build model")
}

fn setup() -> (GameEngine, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().expect("open store"));
    let lexicon = Lexicon::new(WORDS.iter().map(|(w, _)| w.to_string()).filter(|w| w != "notte"));
    let shots = vec![
        ShotEntry { target: "estate".into(), clues: vec!["mare".into(), "vacanze".into()] },
        ShotEntry { target: "notte".into(), clues: vec!["luna".into(), "stelle".into()] },
    ];
    let engine = GameEngine::new(
        GameConfig::default(),
        Arc::new(model()),
        lexicon,
        vec!["sole".into()],
        shots,
        store.clone(),
    )
    .expect("build engine");
    (engine, store)
}

fn update(best_rank: u32, attempts: u32, won: bool) -> ProgressUpdate {
    ProgressUpdate { best_rank, attempts, completed: won, won }
}

#[test]
fn daily_word_is_stable_for_a_date() {
    let (engine, _) = setup();
    let first = engine.daily_assignment(Some("2025-11-20")).expect("assignment");
    let again = engine.daily_assignment(Some("2025-11-20")).expect("assignment");
    assert_eq!(first, again);
    assert_eq!(first.word, "sole");
    assert_eq!(first.game_number, 20);

    let before_epoch = engine.daily_word_info(Some("2025-10-01")).expect("info");
    assert_eq!(before_epoch.game_number, 1);
    assert_eq!(before_epoch.word_length, 4);
}

#[test]
fn guesses_rank_by_closeness() {
    let (engine, _) = setup();
    let date = Some("2025-11-05");

    let exact = engine.guess("  SOLE ", date).expect("guess");
    assert!(exact.correct);
    assert_eq!(exact.rank, Some(1));
    assert_eq!(exact.similarity, Some(1.0));
    assert_eq!(exact.temperature, Some(Temperature::Perfect));

    let luce = engine.guess("luce", date).expect("guess");
    assert!(!luce.correct);
    assert_eq!(luce.rank, Some(1));
    assert_eq!(luce.temperature, Some(Temperature::Perfect));

    let caldo = engine.guess("caldo", date).expect("guess");
    assert_eq!(caldo.temperature, Some(Temperature::Scorching));

    let pioggia = engine.guess("pioggia", date).expect("guess");
    assert_eq!(pioggia.rank, Some(6));
    assert!(pioggia.similarity < luce.similarity);
    assert_eq!(pioggia.total_words, Some(8));
}

#[test]
fn unknown_or_rejected_words_are_invalid() {
    let (engine, _) = setup();

    let unknown = engine.guess("xyzzy", None).expect("guess");
    assert!(!unknown.valid);
    assert_eq!(unknown.rank, None);

    // Known to the model but not in the language list.
    let rejected = engine.guess("notte", None).expect("guess");
    assert!(!rejected.valid);

    assert_eq!(engine.guess("", None).unwrap_err().kind(), "invalid_input");
}

#[test]
fn hint_never_gives_away_the_answer() {
    let (engine, _) = setup();
    for _ in 0..25 {
        let hint = engine.hint(Some("2025-11-05")).expect("hint");
        let word = hint.hint_word.expect("a hint word");
        assert_ne!(word, "sole");
        assert_ne!(word, "notte");
    }
}

#[test]
fn shot_round_resolves_at_most_once() {
    let (engine, _) = setup();
    let round = engine.start_round().expect("round");
    assert_eq!(round.clue_words.len(), 2);
    assert!(round.clue_words.iter().all(|c| c.chars().all(|ch| !ch.is_lowercase())));

    let target = if round.clue_words[0] == "MARE" { "estate" } else { "notte" };
    let miss = engine.resolve_round(&round.round_id, "caldo").expect("miss");
    assert!(!miss.correct);
    assert_eq!(miss.target_word, None);

    let hit = engine.resolve_round(&round.round_id, target).expect("hit");
    assert!(hit.correct);
    assert_eq!(hit.target_word.as_deref(), Some(target));

    let err = engine.resolve_round(&round.round_id, target).unwrap_err();
    assert_eq!(err.kind(), "round_not_found");
}

#[test]
fn leaderboard_puts_winners_first() {
    let (engine, store) = setup();
    let alice = store.register_player("alice", None).expect("alice");
    let bob = store.register_player("bob", Some("avatars/bob.png")).expect("bob");
    let carol = store.register_player("carol", None).expect("carol");
    let date = "2025-11-05";

    engine.record_progress(&bob, date, GameMode::Daily, update(2, 9, false)).expect("bob");
    engine.record_progress(&carol, date, GameMode::Daily, update(40, 3, false)).expect("carol");
    engine.record_progress(&alice, date, GameMode::Daily, update(1, 12, true)).expect("alice");

    let board = engine.leaderboard(date, GameMode::Daily, None, false).expect("board");
    let names: Vec<&str> = board.iter().map(|r| r.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
    assert_eq!(board[1].avatar_path.as_deref(), Some("avatars/bob.png"));

    // Shot progress lives on its own board.
    assert!(engine.leaderboard(date, GameMode::Shot, None, false).expect("board").is_empty());

    store.set_friendship(alice.id, carol.id, FriendshipStatus::Accepted).expect("friends");
    let friends = engine.leaderboard(date, GameMode::Daily, Some(&alice), true).expect("board");
    let names: Vec<&str> = friends.iter().map(|r| r.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "carol"]);
    assert!(friends[1].is_friend);

    let status = engine.friends_status(carol.id, date, GameMode::Daily).expect("status");
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].username, "alice");
    assert!(status[0].won);
}

#[test]
fn statistics_follow_the_recorded_history() {
    let (engine, store) = setup();
    let dana = store.register_player("dana", None).expect("dana");

    engine.record_progress(&dana, "2025-11-01", GameMode::Daily, update(1, 4, true)).expect("day 1");
    engine.record_progress(&dana, "2025-11-02", GameMode::Daily, update(1, 6, true)).expect("day 2");
    engine.record_progress(&dana, "2025-11-03", GameMode::Daily, update(90, 30, false)).expect("day 3");
    engine.record_progress(&dana, "2025-11-04", GameMode::Daily, update(1, 8, true)).expect("day 4");
    engine.record_progress(&dana, "2025-11-04", GameMode::Shot, update(1, 2, true)).expect("shot");
    engine.record_hint(&dana, "2025-11-03", GameMode::Daily).expect("hint");

    let stats = engine.user_statistics(dana.id).expect("stats");
    assert_eq!(stats.total_games, 5);
    assert_eq!(stats.games_won, 4);
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.best_streak, 2);
    assert_eq!(stats.average_attempts, 5.0);
    assert_eq!(stats.total_hints, 1);
    assert_eq!(stats.games_by_mode[&GameMode::Daily].total, 4);

    let history = engine.history(dana.id).expect("history");
    assert_eq!(history.len(), 5);
    assert!(history.windows(2).all(|w| w[0].game_date >= w[1].game_date));
}

#[test]
fn engine_opens_from_files_and_reuses_the_model_cache() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut vec_file = format!("{} 2\n", WORDS.len());
    for (word, deg) in WORDS {
        let v = at(deg);
        vec_file.push_str(&format!("{} {} {}\n", word, v[0], v[1]));
    }
    fs::write(dir.path().join("model.vec"), vec_file).expect("write model");
    fs::write(dir.path().join("daily.txt"), "Sole\nparolasconosciuta\n").expect("write daily");
    fs::write(
        dir.path().join("shots.json"),
        r#"[{"target": "Estate", "clues": ["mare", "vacanze"]}]"#,
    )
    .expect("write shots");

    let config = GameConfig::from_toml(&format!(
        r#"
        model_path = "{0}/model.vec"
        model_cache_path = "{0}/model.bin"
        daily_words_path = "{0}/daily.txt"
        dictionary_path = "{0}/missing_dictionary.txt"
        shot_database_path = "{0}/shots.json"
        "#,
        dir.path().display()
    ))
    .expect("config");

    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let engine = GameEngine::open(config.clone(), store.clone()).expect("first open");
    assert!(config.model_cache_path.exists());
    assert_eq!(engine.daily_assignment(Some("2025-12-25")).expect("word").word, "sole");
    // No dictionary on disk: every model word is playable.
    assert!(engine.guess("notte", None).expect("guess").valid);

    let reopened = GameEngine::open(config, store).expect("second open");
    assert_eq!(reopened.server_stats().vocab_size, 8);
}
