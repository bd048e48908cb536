//! Types for HTTP requests and responses

use retro_core::{BallotMessage, Calculation, RoundResults, Vote};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SaveBallotRequest {
    pub votes: Vec<Vote>,
}

#[derive(Debug, Deserialize)]
pub struct PublishBallotRequest {
    pub signature: String,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    pub message: BallotMessage,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    pub calculation: Option<Calculation>,
    pub threshold: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub round_id: String,
    pub calculation: Calculation,
    #[serde(flatten)]
    pub results: RoundResults,
}

#[derive(Debug, Deserialize)]
pub struct ApproveVotersRequest {
    pub voters: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ApproveVotersResponse {
    pub round_id: String,
    pub approved: usize,
}

#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub nonce: String,
    /// Exact text the wallet must sign
    pub message: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub address: String,
    pub nonce: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub voter: String,
    pub expires_in: u64,
}
