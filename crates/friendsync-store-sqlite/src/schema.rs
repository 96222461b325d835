//! SQL schema for the FriendSync SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 strings in UTC, so `<=` on the text
/// column orders the same way as the instants.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS friends (
    friend_id       TEXT PRIMARY KEY,
    owner_id        TEXT NOT NULL,
    name            TEXT NOT NULL,
    email           TEXT,
    phone           TEXT,
    last_contact_at TEXT,             -- NULL = never contacted
    reminder_days   INTEGER NOT NULL CHECK (reminder_days BETWEEN 1 AND 365),
    version         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS meetings (
    meeting_id       TEXT PRIMARY KEY,
    owner_id         TEXT NOT NULL,
    friend_id        TEXT NOT NULL REFERENCES friends(friend_id) ON DELETE CASCADE,
    title            TEXT NOT NULL,
    date             TEXT NOT NULL,
    duration_minutes INTEGER,
    location         TEXT,
    notes            TEXT
);

-- Serves the coarse filter: owner equality + range on last contact.
CREATE INDEX IF NOT EXISTS friends_owner_contact_idx
    ON friends(owner_id, last_contact_at);
CREATE INDEX IF NOT EXISTS meetings_friend_date_idx ON meetings(friend_id, date);
CREATE INDEX IF NOT EXISTS meetings_owner_date_idx  ON meetings(owner_id, date);

PRAGMA user_version = 1;
";
