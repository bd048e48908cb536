pub mod views;

use chrono::{DateTime, Utc};
use retro_core::{Ballot, PublishedBallot, Round, Vote};
use serde::{Deserialize, Serialize};

/// Round configuration row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: Round,
    pub updated_at: DateTime<Utc>,
}

/// Voter approval row, standing in for an eligibility attestation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterRecord {
    pub round_id: String,
    pub voter_id: String, // lowercase 0x address
    pub approved_at: DateTime<Utc>,
}

/// Ballot row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotRecord {
    pub id: i64,
    pub round_id: String,
    pub voter_id: String,
    pub votes: Vec<Vote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub signature: Option<String>,
}

impl From<BallotRecord> for Ballot {
    fn from(record: BallotRecord) -> Self {
        Ballot {
            voter_id: record.voter_id,
            round_id: record.round_id,
            votes: record.votes,
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
            published_at: record.published_at,
            signature: record.signature,
        }
    }
}

impl From<BallotRecord> for PublishedBallot {
    fn from(record: BallotRecord) -> Self {
        PublishedBallot {
            voter_id: record.voter_id,
            votes: record.votes,
        }
    }
}
