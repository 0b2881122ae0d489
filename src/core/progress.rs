// File: src/core/progress.rs
use crate::core::stats::summarize;
use crate::core::types::{
    FriendStatus, GameKey, LeaderboardEntry, Player, ProgressEntry, ProgressUpdate, SessionRecord, UserId,
    UserStatistics,
};
use crate::error::{GameError, GameResult};
use crate::store::SessionStore;
use chrono::{Duration, Utc};
use log::debug;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Rank shown for durable-only rows that did not win.
pub const UNRANKED: u32 = 99_999;
/// Durable-only winners are estimated at this many rank points per attempt.
const RANK_PER_ATTEMPT: u32 = 100;
/// Sort key for friends without a session.
const NO_ATTEMPTS: u32 = 999;

type LiveGames = HashMap<GameKey, HashMap<UserId, ProgressEntry>>;

/// Merges live, in-process progress with the durable session history.
///
/// The live map holds the latest report of each player per game and is lost on
/// restart; the session store is authoritative across restarts. For any
/// (game, player) the live entry wins when present.
pub struct ProgressAggregator {
    store: Arc<dyn SessionStore>,
    live: RwLock<LiveGames>,
    /// Held across every read-modify-write of a durable session.
    session_writes: Mutex<()>,
    retention_days: i64,
}

impl ProgressAggregator {
    pub fn new(store: Arc<dyn SessionStore>, retention_days: i64) -> Self {
        Self { store, live: RwLock::new(HashMap::new()), session_writes: Mutex::new(()), retention_days }
    }

    /// Last write wins. Also mirrors the report into the durable session and
    /// carries the durable hint count into the live entry.
    pub fn record_progress(&self, key: GameKey, player: &Player, update: ProgressUpdate) -> GameResult<ProgressEntry> {
        if update.best_rank == 0 {
            return Err(GameError::InvalidInput("best_rank starts at 1".into()));
        }
        if update.won && !update.completed {
            return Err(GameError::InvalidInput("a won game must also be completed".into()));
        }

        let _guard = self.session_writes.lock();
        let existing = self.store.get_session(player.id, key.date, key.mode)?;
        let now = Utc::now();
        let entry = ProgressEntry {
            player: player.clone(),
            best_rank: update.best_rank,
            attempts: update.attempts,
            completed: update.completed,
            won: update.won,
            hints_used: existing.as_ref().map_or(0, |s| s.hints_used),
            updated_at: now,
        };

        {
            let mut live = self.live.write();
            live.entry(key).or_default().insert(player.id, entry.clone());
            self.prune_locked(&mut live);
        }

        let mut record = existing.unwrap_or_else(|| SessionRecord::new(player.id, key));
        record.attempts = update.attempts;
        record.completed = update.completed;
        record.won = update.won;
        if update.completed && record.completed_at.is_none() {
            record.completed_at = Some(now);
        }
        self.store.upsert_session(&record)?;
        Ok(entry)
    }

    /// Drops live games older than the retention window, measured back from the
    /// newest game that is not in the future. Future-dated games never move the window.
    fn prune_locked(&self, live: &mut LiveGames) {
        let today = Utc::now().date_naive();
        let Some(anchor) = live.keys().map(|k| k.date).filter(|d| *d <= today).max() else { return };
        let cutoff = anchor - Duration::days(self.retention_days);
        let before = live.len();
        live.retain(|key, _| key.date >= cutoff);
        if live.len() < before {
            debug!("[progress] Dropped {} stale live games", before - live.len());
        }
    }

    /// Adds one used hint to the durable session and the live entry, returning the new count.
    pub fn record_hint(&self, key: GameKey, player: &Player) -> GameResult<u32> {
        let _guard = self.session_writes.lock();
        let mut record = self
            .store
            .get_session(player.id, key.date, key.mode)?
            .unwrap_or_else(|| SessionRecord::new(player.id, key));
        record.hints_used += 1;
        self.store.upsert_session(&record)?;

        if let Some(entry) = self.live.write().get_mut(&key).and_then(|g| g.get_mut(&player.id)) {
            entry.hints_used = record.hints_used;
        }
        Ok(record.hints_used)
    }

    pub fn live_entry(&self, key: &GameKey, user_id: UserId) -> Option<ProgressEntry> {
        self.live.read().get(key).and_then(|g| g.get(&user_id)).cloned()
    }

    /// Players of one game, winners first, then by best rank ascending.
    /// With `friends_only` and a viewer, only the viewer and accepted friends are kept.
    pub fn leaderboard(
        &self,
        key: GameKey,
        viewer: Option<&Player>,
        friends_only: bool,
    ) -> GameResult<Vec<LeaderboardEntry>> {
        let friend_ids = match viewer {
            Some(v) => self.store.accepted_friend_ids(v.id)?,
            None => HashSet::new(),
        };
        let keep = |id: UserId| match viewer {
            Some(v) if friends_only => id == v.id || friend_ids.contains(&id),
            _ => true,
        };

        let mut rows = Vec::new();
        let mut live_ids = HashSet::new();
        if let Some(game) = self.live.read().get(&key) {
            for entry in game.values() {
                live_ids.insert(entry.player.id);
                if keep(entry.player.id) {
                    rows.push(LeaderboardEntry {
                        user_id: entry.player.id,
                        username: entry.player.username.clone(),
                        avatar_path: entry.player.avatar_path.clone(),
                        best_rank: entry.best_rank,
                        attempts: entry.attempts,
                        completed: entry.completed,
                        won: entry.won,
                        is_friend: friend_ids.contains(&entry.player.id),
                        hints_used: entry.hints_used,
                    });
                }
            }
        }

        for (record, player) in self.store.list_sessions_for_game(&key)? {
            if live_ids.contains(&player.id) || !keep(player.id) {
                continue;
            }
            // Best rank is not persisted; estimate it from attempts.
            let best_rank = if record.won {
                record.attempts.saturating_mul(RANK_PER_ATTEMPT)
            } else {
                UNRANKED
            };
            rows.push(LeaderboardEntry {
                user_id: player.id,
                is_friend: friend_ids.contains(&player.id),
                username: player.username,
                avatar_path: player.avatar_path,
                best_rank,
                attempts: record.attempts,
                completed: record.completed,
                won: record.won,
                hints_used: record.hints_used,
            });
        }

        rows.sort_by_key(|r| (!r.won, r.best_rank, r.user_id));
        Ok(rows)
    }

    pub fn user_statistics(&self, user_id: UserId) -> GameResult<UserStatistics> {
        Ok(summarize(&self.store.list_sessions_for_user(user_id)?))
    }

    pub fn history(&self, user_id: UserId) -> GameResult<Vec<SessionRecord>> {
        self.store.list_sessions_for_user(user_id)
    }

    /// How each accepted friend did in one game: completed first, then fewest attempts.
    pub fn friends_status(&self, user_id: UserId, key: GameKey) -> GameResult<Vec<FriendStatus>> {
        let mut statuses = Vec::new();
        for friend_id in self.store.accepted_friend_ids(user_id)? {
            let Some(friend) = self.store.find_player(friend_id)? else { continue };
            let session = self.store.get_session(friend_id, key.date, key.mode)?;
            statuses.push(FriendStatus {
                user_id: friend.id,
                username: friend.username,
                avatar_path: friend.avatar_path,
                played: session.is_some(),
                completed: session.as_ref().is_some_and(|s| s.completed),
                won: session.as_ref().is_some_and(|s| s.won),
                attempts: session.as_ref().map(|s| s.attempts),
            });
        }
        statuses.sort_by(|a, b| {
            (!a.completed, a.attempts.unwrap_or(NO_ATTEMPTS), &a.username)
                .cmp(&(!b.completed, b.attempts.unwrap_or(NO_ATTEMPTS), &b.username))
        });
        Ok(statuses)
    }
}
