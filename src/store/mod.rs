// File: src/store/mod.rs
//
// Seams to the durable side of the game: session history, friendships and
// player identity. The engine only talks to these traits; `SqliteStore` is the
// bundled implementation.

use crate::core::types::{GameKey, GameMode, Player, SessionRecord, UserId};
use crate::error::GameResult;
use chrono::NaiveDate;
use std::collections::HashSet;

mod sqlite;

pub use sqlite::{FriendshipStatus, SqliteStore};

/// Durable session history and friendship edges.
/// Every call is one atomic unit; callers add no rollback of their own.
pub trait SessionStore: Send + Sync {
    fn get_session(&self, user_id: UserId, date: NaiveDate, mode: GameMode) -> GameResult<Option<SessionRecord>>;

    /// Inserts or replaces the record for `(user, date, mode)`.
    fn upsert_session(&self, record: &SessionRecord) -> GameResult<()>;

    /// All sessions of a player, newest date first.
    fn list_sessions_for_user(&self, user_id: UserId) -> GameResult<Vec<SessionRecord>>;

    /// Every player's record for one game, with display identity.
    fn list_sessions_for_game(&self, key: &GameKey) -> GameResult<Vec<(SessionRecord, Player)>>;

    /// Accepted friends, whichever side sent the request.
    fn accepted_friend_ids(&self, user_id: UserId) -> GameResult<HashSet<UserId>>;

    fn find_player(&self, user_id: UserId) -> GameResult<Option<Player>>;
}

/// Turns an opaque caller credential into a player.
/// Any failure is reported as `None`: there is simply no current user.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credential: &str) -> Option<Player>;
}
