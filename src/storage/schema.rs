//! Database schema and connection management

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Database connection manager for players and bids
///
/// Each handle owns one connection. Threads that need to write concurrently
/// open their own handle on the same file; SQLite serializes writers and
/// `lock_timeout` bounds how long a writer waits for the lock.
pub struct PlayerDatabase {
    pub(crate) conn: Connection,
}

impl PlayerDatabase {
    /// Open (or create) a database file and ensure tables exist
    pub fn open(path: &Path, lock_timeout: Duration) -> Result<Self> {
        // Ensure the data directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(lock_timeout)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let mut db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema (idempotent)
    pub(crate) fn initialize_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    season TEXT,
    nation TEXT,
    position TEXT,
    age REAL,
    squad TEXT,
    comp TEXT,
    p_score REAL,
    base_value REAL,
    elite_score REAL,
    market_premium REAL,
    final_mvpa REAL,
    scout_note TEXT,
    stats TEXT,
    p_score_derived INTEGER NOT NULL DEFAULT 0,
    revision INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS user_bids (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    player_id INTEGER NOT NULL,
    phase1_bid REAL,
    phase2_bid REAL,
    phase3_bid REAL,
    timestamp INTEGER NOT NULL,
    UNIQUE (session_id, player_id),
    CHECK (phase1_bid IS NULL OR phase1_bid >= 0),
    CHECK (phase2_bid IS NULL OR (phase1_bid IS NOT NULL AND phase2_bid >= phase1_bid)),
    CHECK (phase3_bid IS NULL OR (phase2_bid IS NOT NULL AND phase3_bid >= phase2_bid)),
    FOREIGN KEY (player_id) REFERENCES players(id)
);

CREATE TABLE IF NOT EXISTS bid_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    bid_id INTEGER NOT NULL,
    session_id TEXT NOT NULL,
    player_id INTEGER NOT NULL,
    phase INTEGER NOT NULL CHECK (phase BETWEEN 1 AND 3),
    bid_amount REAL NOT NULL,
    time_taken REAL,
    mvpa_shown REAL,
    ceiling REAL,
    timestamp INTEGER NOT NULL,
    FOREIGN KEY (bid_id) REFERENCES user_bids(id),
    FOREIGN KEY (player_id) REFERENCES players(id)
);

CREATE INDEX IF NOT EXISTS idx_players_name_season ON players(name, season);
CREATE INDEX IF NOT EXISTS idx_players_season ON players(season);
CREATE INDEX IF NOT EXISTS idx_user_bids_player ON user_bids(player_id);
CREATE INDEX IF NOT EXISTS idx_bid_events_bid ON bid_events(bid_id);
";
