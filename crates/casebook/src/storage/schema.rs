//! `SQLite` schema definitions for the slot backend.
//!
//! The database is a plain key-value store: every slot holds one text value.
//! Records live as a single JSON array in one slot; the layout of that array
//! is owned by the record store, not by the schema.

/// SQL statement to create the slots table.
pub const CREATE_SLOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS slots (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the metadata table for schema version and revision.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement seeding the shared change counter.
pub const SEED_REVISION: &str = r"
INSERT OR IGNORE INTO metadata (key, value) VALUES ('revision', '0')
";

/// All base schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_SLOTS_TABLE, CREATE_METADATA_TABLE];
