// File: src/core/stats.rs
use crate::core::types::{SessionRecord, UserStatistics};

/// Streaks over outcomes ordered most recent first.
/// Returns `(current, best)`: `current` is the run of wins at the head of the
/// sequence (0 when the latest game was lost), `best` the longest run anywhere.
pub fn streaks<I: IntoIterator<Item = bool>>(won_newest_first: I) -> (u32, u32) {
    let mut current = 0;
    let mut best = 0;
    let mut run = 0;
    let mut at_head = true;

    for won in won_newest_first {
        if won {
            run += 1;
            best = best.max(run);
            if at_head {
                current = run;
            }
        } else {
            at_head = false;
            run = 0;
        }
    }
    (current, best)
}

/// Summarises a player's durable history. `sessions` must be ordered by date, newest first.
pub fn summarize(sessions: &[SessionRecord]) -> UserStatistics {
    let mut stats = UserStatistics { total_games: sessions.len() as u32, ..Default::default() };

    let (current, best) = streaks(sessions.iter().map(|s| s.won));
    stats.current_streak = current;
    stats.best_streak = best;

    let mut won_attempts: u64 = 0;
    for session in sessions {
        let tally = stats.games_by_mode.entry(session.mode).or_default();
        tally.total += 1;
        if session.won {
            tally.won += 1;
            stats.games_won += 1;
            won_attempts += session.attempts as u64;
        }
        stats.total_hints += session.hints_used;
    }

    if stats.games_won > 0 {
        let mean = won_attempts as f64 / stats.games_won as f64;
        stats.average_attempts = (mean * 10.0).round() / 10.0;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{parse_date, GameKey, GameMode, ModeTally};

    fn record(date: &str, mode: GameMode, won: bool, attempts: u32, hints: u32) -> SessionRecord {
        let mut r = SessionRecord::new(7, GameKey::new(parse_date(date).unwrap(), mode));
        r.won = won;
        r.completed = true;
        r.attempts = attempts;
        r.hints_used = hints;
        r
    }

    #[test]
    fn win_win_loss_win() {
        assert_eq!(streaks([true, true, false, true]), (2, 2));
    }

    #[test]
    fn latest_loss_resets_the_current_streak() {
        assert_eq!(streaks([false, true, true, true]), (0, 3));
    }

    #[test]
    fn best_streak_can_be_in_the_past() {
        assert_eq!(streaks([true, false, true, true, true, false]), (1, 3));
        assert_eq!(streaks([true, true, true]), (3, 3));
        assert_eq!(streaks(Vec::new()), (0, 0));
    }

    #[test]
    fn summary_counts_modes_hints_and_average() {
        let history = vec![
            record("2025-11-05", GameMode::Daily, true, 12, 1),
            record("2025-11-04", GameMode::Shot, true, 3, 0),
            record("2025-11-03", GameMode::Daily, false, 40, 2),
            record("2025-11-02", GameMode::Daily, true, 20, 0),
        ];
        let stats = summarize(&history);
        assert_eq!(stats.total_games, 4);
        assert_eq!(stats.games_won, 3);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.best_streak, 2);
        assert_eq!(stats.average_attempts, 11.7);
        assert_eq!(stats.total_hints, 3);
        assert_eq!(stats.games_by_mode[&GameMode::Daily], ModeTally { total: 3, won: 2 });
        assert_eq!(stats.games_by_mode[&GameMode::Shot], ModeTally { total: 1, won: 1 });
    }

    #[test]
    fn no_wins_means_zero_average() {
        let stats = summarize(&[record("2025-11-05", GameMode::Daily, false, 9, 0)]);
        assert_eq!(stats.average_attempts, 0.0);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(summarize(&[]), UserStatistics::default());
    }
}
