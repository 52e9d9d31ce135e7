//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per (subject, identity). The primary key is the deduplication
-- mechanism: concurrent inserts for the same pair collapse to one row.
CREATE TABLE IF NOT EXISTS likes (
    subject_kind   TEXT NOT NULL,   -- 'post' | 'comment'
    subject_id     TEXT NOT NULL,
    identity_kind  TEXT NOT NULL,   -- 'registered' | 'anonymous'
    identity_value TEXT NOT NULL,
    created_at     TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    PRIMARY KEY (subject_kind, subject_id, identity_kind, identity_value)
);

-- Denormalized counts. like_count and comment_count are a best-effort
-- mirror; view_count is the only durable record of views.
CREATE TABLE IF NOT EXISTS stats_snapshots (
    subject_kind  TEXT    NOT NULL,
    subject_id    TEXT    NOT NULL,
    like_count    INTEGER NOT NULL DEFAULT 0,
    comment_count INTEGER NOT NULL DEFAULT 0,
    view_count    INTEGER NOT NULL DEFAULT 0,
    updated_at    TEXT    NOT NULL,
    PRIMARY KEY (subject_kind, subject_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    post_id    TEXT NOT NULL,
    user_id    TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS comments_post_idx ON comments(post_id, created_at);

PRAGMA user_version = 1;
";
