//! SQL schema for the SQLite directory.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS journals (
    journal_id      INTEGER PRIMARY KEY,
    path            TEXT NOT NULL UNIQUE,
    primary_locale  TEXT NOT NULL
);

-- One row per group; the default group of a role is what imports assign.
CREATE TABLE IF NOT EXISTS user_groups (
    group_id    INTEGER PRIMARY KEY,
    journal_id  INTEGER NOT NULL REFERENCES journals(journal_id),
    role        TEXT NOT NULL,      -- 'Reader' | 'Author' | 'Reviewer'
    is_default  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS users (
    user_id               INTEGER PRIMARY KEY,
    username              TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email                 TEXT NOT NULL UNIQUE COLLATE NOCASE,
    given_name            TEXT NOT NULL,
    family_name           TEXT NOT NULL,
    affiliation           TEXT,
    country               TEXT NOT NULL,
    locales               TEXT NOT NULL DEFAULT '[]',   -- JSON array
    password              TEXT NOT NULL,                -- opaque hash
    must_change_password  INTEGER NOT NULL DEFAULT 0,
    date_registered       TEXT NOT NULL                 -- RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS user_user_groups (
    user_id   INTEGER NOT NULL REFERENCES users(user_id),
    group_id  INTEGER NOT NULL REFERENCES user_groups(group_id),
    PRIMARY KEY (user_id, group_id)
);

-- At most one individual subscription per user and journal.
CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id   INTEGER PRIMARY KEY,
    journal_id        INTEGER NOT NULL REFERENCES journals(journal_id),
    user_id           INTEGER NOT NULL REFERENCES users(user_id),
    type_id           INTEGER NOT NULL,
    date_start        TEXT NOT NULL,   -- YYYY-MM-DD
    date_end          TEXT NOT NULL,   -- YYYY-MM-DD
    status            TEXT NOT NULL DEFAULT 'active',
    membership        TEXT,
    reference_number  TEXT,
    notes             TEXT,
    UNIQUE (user_id, journal_id)
);

CREATE INDEX IF NOT EXISTS user_groups_role_idx ON user_groups(journal_id, role);

PRAGMA user_version = 1;
";
