//! SQL schema for the dropwatch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per account ever polled successfully. An account with an empty
-- inventory still has a row here, which is what marks it as baselined.
CREATE TABLE IF NOT EXISTS accounts (
    account_id  TEXT PRIMARY KEY
);

-- Item ids seen in each account's last poll. Replaced wholesale on save.
CREATE TABLE IF NOT EXISTS seen_items (
    account_id  TEXT NOT NULL REFERENCES accounts(account_id),
    item_id     TEXT NOT NULL,
    PRIMARY KEY (account_id, item_id)
);

PRAGMA user_version = 1;
";
