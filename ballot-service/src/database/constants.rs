//! Database migration constants and metadata

/// Current database schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptions
pub const MIGRATION_DESCRIPTIONS: &[&str] = &["Rounds, approved voters and ballots"];

/// Default database file name
pub const DEFAULT_DB_PATH: &str = "ballots.db";

/// Pool size for file-backed databases. In-memory databases use one connection.
pub const MAX_CONNECTIONS: u32 = 8;
