//! SQL schema for the Foyer SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS identities (
    identity_id    TEXT PRIMARY KEY,
    email          TEXT NOT NULL,   -- stored normalized (trimmed, lowercased)
    name           TEXT NOT NULL,
    preferred_name TEXT,
    workplace      TEXT,
    disciplines    TEXT NOT NULL,   -- JSON array of discipline labels
    credential     TEXT,            -- argon2 PHC string; NULL only for rows
                                    -- imported without one
    created_at     TEXT NOT NULL,   -- ISO 8601 UTC
    updated_at     TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS identities_email_idx ON identities(email);

-- Visits are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS visits (
    visit_id     TEXT PRIMARY KEY,
    identity_id  TEXT NOT NULL REFERENCES identities(identity_id),
    recorded_at  TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    reason       TEXT NOT NULL,   -- sanitized, 10-500 chars
    disciplines  TEXT NOT NULL    -- snapshot at visit time, JSON array
);

CREATE INDEX IF NOT EXISTS visits_identity_idx ON visits(identity_id);
CREATE INDEX IF NOT EXISTS visits_recorded_idx ON visits(recorded_at);
-- Serves the duplicate-suppression probe and per-identity history reads.
CREATE INDEX IF NOT EXISTS visits_identity_recorded_idx
    ON visits(identity_id, recorded_at);

PRAGMA user_version = 1;
";
