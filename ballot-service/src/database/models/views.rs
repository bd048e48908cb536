//! API response view models

use retro_core::{Ballot, BallotStatus, Round, RoundPhase};
use serde::Serialize;

/// Ballot as returned to its voter
#[derive(Debug, Clone, Serialize)]
pub struct BallotView {
    #[serde(flatten)]
    pub ballot: Ballot,
    pub status: BallotStatus,
    pub hashed_votes: String,
}

impl From<Ballot> for BallotView {
    fn from(ballot: Ballot) -> Self {
        let status = ballot.status();
        let hashed_votes = retro_core::hash_votes(&ballot.votes);
        BallotView {
            ballot,
            status,
            hashed_votes,
        }
    }
}

/// Round configuration with its current phase
#[derive(Debug, Clone, Serialize)]
pub struct RoundView {
    #[serde(flatten)]
    pub round: Round,
    pub phase: RoundPhase,
}
