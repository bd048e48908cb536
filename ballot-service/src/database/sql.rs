//! SQL statement constants for database operations

pub const CREATE_MIGRATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL,
    description TEXT NOT NULL
)
"#;

pub const CREATE_ROUNDS_TABLE_SQL: &str = r#"
CREATE TABLE rounds (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    start_at TEXT,
    review_at TEXT,
    vote_at TEXT,
    result_at TEXT,
    payout_at TEXT,
    max_votes_total REAL,
    max_votes_project REAL,
    chain_id INTEGER NOT NULL,
    calculation TEXT NOT NULL,
    threshold INTEGER,
    pool_amount REAL,
    updated_at TEXT NOT NULL
)
"#;

pub const CREATE_VOTERS_TABLE_SQL: &str = r#"
CREATE TABLE voters (
    round_id TEXT NOT NULL REFERENCES rounds(id),
    voter_id TEXT NOT NULL,
    approved_at TEXT NOT NULL,
    PRIMARY KEY (round_id, voter_id)
)
"#;

pub const CREATE_BALLOTS_TABLE_SQL: &str = r#"
CREATE TABLE ballots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    round_id TEXT NOT NULL REFERENCES rounds(id),
    voter_id TEXT NOT NULL,
    votes TEXT NOT NULL, -- canonical JSON array
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    published_at TEXT,
    signature TEXT,
    UNIQUE (round_id, voter_id)
)
"#;

pub const CREATE_DB_INDEXES: &[&str] = &[
    "CREATE INDEX idx_ballots_published ON ballots(round_id, published_at)",
];

pub const UPSERT_ROUND_SQL: &str = r#"
INSERT INTO rounds
    (id, name, start_at, review_at, vote_at, result_at, payout_at, max_votes_total,
     max_votes_project, chain_id, calculation, threshold, pool_amount, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    start_at = excluded.start_at,
    review_at = excluded.review_at,
    vote_at = excluded.vote_at,
    result_at = excluded.result_at,
    payout_at = excluded.payout_at,
    max_votes_total = excluded.max_votes_total,
    max_votes_project = excluded.max_votes_project,
    chain_id = excluded.chain_id,
    calculation = excluded.calculation,
    threshold = excluded.threshold,
    pool_amount = excluded.pool_amount,
    updated_at = excluded.updated_at
"#;

/// Refuses to overwrite a published ballot: zero affected rows means it was published.
pub const SAVE_BALLOT_SQL: &str = r#"
INSERT INTO ballots (round_id, voter_id, votes, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT(round_id, voter_id) DO UPDATE SET
    votes = excluded.votes,
    updated_at = excluded.updated_at
WHERE ballots.published_at IS NULL
"#;

/// One-shot publish of exactly the votes that were verified.
pub const PUBLISH_BALLOT_SQL: &str = r#"
UPDATE ballots
SET published_at = ?, signature = ?
WHERE round_id = ? AND voter_id = ? AND votes = ? AND published_at IS NULL
"#;
