pub mod utils;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;
use retro_core::{
    calculate_votes, hash_votes,
    typed_data::{sign_ballot, sign_in_message, sign_personal_message},
    Address, BallotMessage, CalculationOptions, PublishedBallot, RoundResults, Vote,
};
use secp256k1::SecretKey;
use serde::{Deserialize, Serialize};

use crate::utils::read_input;

/// Either a bare vote list or a saved ballot body
#[derive(Deserialize)]
#[serde(untagged)]
enum VotesFile {
    Bare(Vec<Vote>),
    Ballot { votes: Vec<Vote> },
}

/// Body accepted by the publish endpoint
#[derive(Debug, Serialize)]
pub struct SignedBallot {
    pub voter: String,
    pub signature: String,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    pub message: BallotMessage,
}

#[derive(Debug, Serialize)]
pub struct SignedSignIn {
    pub address: String,
    pub nonce: String,
    pub signature: String,
}

pub fn parse_votes(bytes: &[u8]) -> Result<Vec<Vote>> {
    let file: VotesFile = serde_json::from_slice(bytes).context("Failed to parse votes")?;
    Ok(match file {
        VotesFile::Bare(votes) | VotesFile::Ballot { votes } => votes,
    })
}

pub fn read_votes(path: &Path) -> Result<Vec<Vote>> {
    let bytes = read_input(path, false).with_context(|| format!("Failed to read {:?}", path))?;
    parse_votes(&bytes)
}

pub fn parse_published_ballots(bytes: &[u8]) -> Result<Vec<PublishedBallot>> {
    serde_json::from_slice(bytes).context("Failed to parse published ballots")
}

pub fn read_published_ballots(path: &Path, is_compressed: bool) -> Result<Vec<PublishedBallot>> {
    let bytes =
        read_input(path, is_compressed).with_context(|| format!("Failed to read {:?}", path))?;
    parse_published_ballots(&bytes)
}

pub fn sign_votes(secret_key: &SecretKey, chain_id: u64, votes: &[Vote]) -> Result<SignedBallot> {
    let message = BallotMessage::for_votes(votes);
    let signature = sign_ballot(secret_key, chain_id, &message).map_err(|e| anyhow!(e))?;
    let voter = Address::from_secret_key(secret_key);
    info!(
        "Signed ballot for {} on chain {} ({})",
        voter, chain_id, message.hashed_votes
    );

    Ok(SignedBallot {
        voter: voter.to_string(),
        signature,
        chain_id,
        message,
    })
}

pub fn sign_in(secret_key: &SecretKey, nonce: &str) -> Result<SignedSignIn> {
    let signature =
        sign_personal_message(secret_key, &sign_in_message(nonce)).map_err(|e| anyhow!(e))?;
    Ok(SignedSignIn {
        address: Address::from_secret_key(secret_key).to_string(),
        nonce: nonce.to_string(),
        signature,
    })
}

pub fn tally(
    ballots: &[PublishedBallot],
    options: &CalculationOptions,
    pool_amount: Option<f64>,
) -> RoundResults {
    info!(
        "Tallying {} ballots ({}, threshold {:?})",
        ballots.len(),
        options.calculation,
        options.threshold
    );
    let results = calculate_votes(ballots, options);
    match pool_amount {
        Some(pool) => results.with_payouts(pool),
        None => results,
    }
}

pub fn votes_hash(votes: &[Vote]) -> String {
    hash_votes(votes)
}
