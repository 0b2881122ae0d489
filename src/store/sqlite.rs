// File: src/store/sqlite.rs
use super::{IdentityResolver, SessionStore};
use crate::core::types::{format_date, GameKey, GameMode, Player, SessionRecord, UserId, DATE_FORMAT};
use crate::error::GameResult;
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

const SESSION_COLUMNS: &str =
    "s.user_id, s.game_date, s.game_mode, s.attempts, s.completed, s.won, s.completed_at, s.hints_used";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Rejected => "rejected",
        }
    }
}

/// SQLite-backed session history. One connection behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> GameResult<Self> {
        info!("[store] Opening session store at {:?}", path);
        let conn = Connection::open(path)?;
        if let Err(e) = conn.execute_batch("PRAGMA journal_mode=WAL;") {
            warn!("[store] WAL unavailable: {}", e);
        }
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> GameResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> GameResult<Self> {
        run_migrations(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Creates the player or updates the avatar of an existing username.
    pub fn register_player(&self, username: &str, avatar_path: Option<&str>) -> GameResult<Player> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO players (username, avatar_path) VALUES (?1, ?2)
             ON CONFLICT(username) DO UPDATE SET avatar_path = excluded.avatar_path",
            params![username, avatar_path],
        )?;
        let player = conn.query_row(
            "SELECT id, username, avatar_path FROM players WHERE username = ?1",
            params![username],
            row_to_player,
        )?;
        Ok(player)
    }

    pub fn find_player_by_username(&self, username: &str) -> GameResult<Option<Player>> {
        let conn = self.conn.lock();
        let player = conn
            .query_row(
                "SELECT id, username, avatar_path FROM players WHERE username = ?1",
                params![username],
                row_to_player,
            )
            .optional()?;
        Ok(player)
    }

    /// Records the directed edge `user_id -> friend_id` with the given status.
    pub fn set_friendship(&self, user_id: UserId, friend_id: UserId, status: FriendshipStatus) -> GameResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO friendships (user_id, friend_id, status) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, friend_id) DO UPDATE SET status = excluded.status",
            params![user_id, friend_id, status.as_str()],
        )?;
        Ok(())
    }
}

impl SessionStore for SqliteStore {
    fn get_session(&self, user_id: UserId, date: NaiveDate, mode: GameMode) -> GameResult<Option<SessionRecord>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM game_sessions s WHERE s.user_id = ?1 AND s.game_date = ?2 AND s.game_mode = ?3",
            SESSION_COLUMNS
        );
        let record = conn
            .query_row(&sql, params![user_id, format_date(date), mode.as_str()], row_to_session)
            .optional()?;
        Ok(record)
    }

    fn upsert_session(&self, record: &SessionRecord) -> GameResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO game_sessions
                (user_id, game_date, game_mode, attempts, completed, won, completed_at, hints_used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id, game_date, game_mode) DO UPDATE SET
                attempts = excluded.attempts,
                completed = excluded.completed,
                won = excluded.won,
                completed_at = excluded.completed_at,
                hints_used = excluded.hints_used",
            params![
                record.user_id,
                format_date(record.game_date),
                record.mode.as_str(),
                record.attempts,
                record.completed,
                record.won,
                record.completed_at.map(|t| t.to_rfc3339()),
                record.hints_used,
            ],
        )?;
        Ok(())
    }

    fn list_sessions_for_user(&self, user_id: UserId) -> GameResult<Vec<SessionRecord>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM game_sessions s WHERE s.user_id = ?1 ORDER BY s.game_date DESC, s.id DESC",
            SESSION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![user_id], row_to_session)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn list_sessions_for_game(&self, key: &GameKey) -> GameResult<Vec<(SessionRecord, Player)>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {}, p.id, p.username, p.avatar_path
             FROM game_sessions s JOIN players p ON p.id = s.user_id
             WHERE s.game_date = ?1 AND s.game_mode = ?2
             ORDER BY s.id",
            SESSION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![format_date(key.date), key.mode.as_str()], |row| {
                let record = row_to_session(row)?;
                let player = Player { id: row.get(8)?, username: row.get(9)?, avatar_path: row.get(10)? };
                Ok((record, player))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn accepted_friend_ids(&self, user_id: UserId) -> GameResult<HashSet<UserId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT user_id, friend_id FROM friendships
             WHERE status = 'accepted' AND (user_id = ?1 OR friend_id = ?1)",
        )?;
        let ids = stmt
            .query_map(params![user_id], |row| {
                let (from, to): (UserId, UserId) = (row.get(0)?, row.get(1)?);
                Ok(if from == user_id { to } else { from })
            })?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    fn find_player(&self, user_id: UserId) -> GameResult<Option<Player>> {
        let conn = self.conn.lock();
        let player = conn
            .query_row(
                "SELECT id, username, avatar_path FROM players WHERE id = ?1",
                params![user_id],
                row_to_player,
            )
            .optional()?;
        Ok(player)
    }
}

impl IdentityResolver for SqliteStore {
    /// The bundled store identifies players by username.
    fn resolve(&self, credential: &str) -> Option<Player> {
        match self.find_player_by_username(credential.trim()) {
            Ok(player) => player,
            Err(e) => {
                warn!("[store] Identity lookup failed: {}", e);
                None
            }
        }
    }
}

fn run_migrations(conn: &Connection) -> GameResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            avatar_path TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS game_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES players(id),
            game_date TEXT NOT NULL,
            game_mode TEXT NOT NULL DEFAULT 'daily',
            attempts INTEGER NOT NULL DEFAULT 0,
            completed INTEGER NOT NULL DEFAULT 0,
            won INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT,
            hints_used INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (user_id, game_date, game_mode)
        );

        CREATE INDEX IF NOT EXISTS idx_game_sessions_game
            ON game_sessions(game_date, game_mode);

        CREATE TABLE IF NOT EXISTS friendships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES players(id),
            friend_id INTEGER NOT NULL REFERENCES players(id),
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (user_id, friend_id)
        );
        ",
    )?;
    Ok(())
}

fn row_to_player(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player { id: row.get(0)?, username: row.get(1)?, avatar_path: row.get(2)? })
}

/// Maps the `SESSION_COLUMNS` prefix of a row.
fn row_to_session(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    let raw_date: String = row.get(1)?;
    let game_date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let raw_mode: String = row.get(2)?;
    let mode = raw_mode
        .parse::<GameMode>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let completed_at = row
        .get::<_, Option<String>>(6)?
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))
        })
        .transpose()?;

    Ok(SessionRecord {
        user_id: row.get(0)?,
        game_date,
        mode,
        attempts: row.get(3)?,
        completed: row.get(4)?,
        won: row.get(5)?,
        completed_at,
        hints_used: row.get(7)?,
    })
}
