use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BallotError;
use crate::state::vote::{sum_votes, Vote};

/// Lifecycle of a voter's ballot. `Published` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotStatus {
    Draft,
    Saved,
    Published,
}

/// A voter's full vote allocation for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ballot {
    /// Voter address, lowercase 0x-prefixed hex
    pub voter_id: String,
    pub round_id: String,
    /// Votes in the order the voter saved them. The order is part of the commitment hash.
    pub votes: Vec<Vote>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub signature: Option<String>,
}

impl Ballot {
    /// An unsaved ballot with no votes.
    pub fn draft(voter_id: impl Into<String>, round_id: impl Into<String>) -> Self {
        Self {
            voter_id: voter_id.into(),
            round_id: round_id.into(),
            votes: Vec::new(),
            created_at: None,
            updated_at: None,
            published_at: None,
            signature: None,
        }
    }

    pub fn status(&self) -> BallotStatus {
        if self.published_at.is_some() {
            BallotStatus::Published
        } else if self.created_at.is_some() {
            BallotStatus::Saved
        } else {
            BallotStatus::Draft
        }
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    pub fn total_votes(&self) -> f64 {
        sum_votes(&self.votes)
    }

    pub fn ensure_not_published(&self) -> Result<(), BallotError> {
        if self.is_published() {
            return Err(BallotError::AlreadyPublished);
        }
        Ok(())
    }
}
