//! Commitment hash over a ballot's vote set

use sha3::{Digest, Keccak256};

use crate::error::BallotError;
use crate::state::{js_number, Vote};

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Canonical serialization of a vote list: compact JSON, stored order,
/// `{"projectId","amount"}` key order, JavaScript number formatting.
pub fn canonical_votes(votes: &[Vote]) -> String {
    let entries: Vec<String> = votes
        .iter()
        .map(|vote| {
            format!(
                "{{\"projectId\":{},\"amount\":{}}}",
                serde_json::Value::String(vote.project_id.clone()),
                js_number(vote.amount)
            )
        })
        .collect();
    format!("[{}]", entries.join(","))
}

/// `0x`-prefixed keccak256 of the canonical vote serialization.
pub fn hash_votes(votes: &[Vote]) -> String {
    format!("0x{}", hex::encode(keccak256(canonical_votes(votes).as_bytes())))
}

/// Require the client-submitted hash to commit to exactly the stored votes.
/// The comparison is exact: the hash must be `0x`-prefixed lowercase hex.
pub fn verify_votes_hash(hashed_votes: &str, votes: &[Vote]) -> Result<(), BallotError> {
    if hashed_votes == hash_votes(votes) {
        Ok(())
    } else {
        Err(BallotError::HashMismatch)
    }
}
