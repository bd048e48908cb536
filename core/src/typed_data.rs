//! Typed-data (EIP-712) ballot signatures and personal-message (EIP-191)
//! sign-in signatures over secp256k1.

use std::fmt;
use std::str::FromStr;

use log::debug;
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, Secp256k1, SecretKey,
};
use serde::{Deserialize, Serialize};

use crate::commitment::{hash_votes, keccak256};
use crate::error::BallotError;
use crate::state::{sum_votes, Vote};

pub const DOMAIN_NAME: &str = "Sign votes";
pub const DOMAIN_VERSION: &str = "1";

const EIP712_DOMAIN_TYPE: &str = "EIP712Domain(string name,string version,uint256 chainId)";
const BALLOT_TYPE: &str = "Ballot(uint256 total_votes,uint256 project_count,string hashed_votes)";

/// 20-byte account address, displayed as lowercase 0x hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let uncompressed = public_key.serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Address(bytes)
    }

    pub fn from_secret_key(secret_key: &SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        Self::from_public_key(&PublicKey::from_secret_key(&secp, secret_key))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| format!("Invalid hex: {}", e))?;
        if bytes.len() != 20 {
            return Err(format!("Expected 20 bytes, got {}", bytes.len()));
        }
        let mut array = [0u8; 20];
        array.copy_from_slice(&bytes);
        Ok(Address(array))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// The typed message a voter signs when publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotMessage {
    pub total_votes: u64,
    pub project_count: u64,
    pub hashed_votes: String,
}

impl BallotMessage {
    /// Message committing to the given votes, as a wallet client would build it.
    pub fn for_votes(votes: &[Vote]) -> Self {
        Self {
            total_votes: sum_votes(votes).floor() as u64,
            project_count: votes.len() as u64,
            hashed_votes: hash_votes(votes),
        }
    }

    fn struct_hash(&self) -> [u8; 32] {
        let mut encoded = Vec::with_capacity(32 * 4);
        encoded.extend_from_slice(&keccak256(BALLOT_TYPE.as_bytes()));
        encoded.extend_from_slice(&encode_uint(self.total_votes));
        encoded.extend_from_slice(&encode_uint(self.project_count));
        encoded.extend_from_slice(&keccak256(self.hashed_votes.as_bytes()));
        keccak256(&encoded)
    }
}

fn encode_uint(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn domain_separator(chain_id: u64) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(32 * 4);
    encoded.extend_from_slice(&keccak256(EIP712_DOMAIN_TYPE.as_bytes()));
    encoded.extend_from_slice(&keccak256(DOMAIN_NAME.as_bytes()));
    encoded.extend_from_slice(&keccak256(DOMAIN_VERSION.as_bytes()));
    encoded.extend_from_slice(&encode_uint(chain_id));
    keccak256(&encoded)
}

/// EIP-712 signing digest of a ballot message on the given chain.
pub fn ballot_digest(message: &BallotMessage, chain_id: u64) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(2 + 32 * 2);
    encoded.extend_from_slice(&[0x19, 0x01]);
    encoded.extend_from_slice(&domain_separator(chain_id));
    encoded.extend_from_slice(&message.struct_hash());
    keccak256(&encoded)
}

/// Text a wallet signs to open a session for the given nonce.
pub fn sign_in_message(nonce: &str) -> String {
    format!("Sign in to ballot service\nNonce: {}", nonce)
}

/// EIP-191 `personal_sign` digest of a UTF-8 message.
pub fn personal_message_digest(message: &str) -> [u8; 32] {
    let mut encoded = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    encoded.extend_from_slice(message.as_bytes());
    keccak256(&encoded)
}

/// Recover the signer of a 65-byte `r || s || v` hex signature.
pub fn recover_signer(digest: &[u8; 32], signature: &str) -> Result<Address, BallotError> {
    let raw = signature.strip_prefix("0x").unwrap_or(signature);
    let bytes = hex::decode(raw).map_err(|e| BallotError::InvalidSignature(e.to_string()))?;
    if bytes.len() != 65 {
        return Err(BallotError::InvalidSignature(format!(
            "expected 65 bytes, got {}",
            bytes.len()
        )));
    }

    let recovery_id = match bytes[64] {
        0 | 27 => 0,
        1 | 28 => 1,
        v => {
            return Err(BallotError::InvalidSignature(format!(
                "unsupported recovery byte {}",
                v
            )))
        }
    };
    let recovery_id = RecoveryId::from_i32(recovery_id)
        .map_err(|e| BallotError::InvalidSignature(e.to_string()))?;
    let signature = RecoverableSignature::from_compact(&bytes[..64], recovery_id)
        .map_err(|e| BallotError::InvalidSignature(e.to_string()))?;
    let message = Message::from_digest_slice(digest)
        .map_err(|e| BallotError::InvalidSignature(e.to_string()))?;

    let public_key = Secp256k1::verification_only()
        .recover_ecdsa(&message, &signature)
        .map_err(|e| BallotError::InvalidSignature(e.to_string()))?;
    Ok(Address::from_public_key(&public_key))
}

/// Check that `signature` over the ballot message on `chain_id` was made by `voter`.
pub fn verify_ballot_signature(
    voter: &Address,
    chain_id: u64,
    message: &BallotMessage,
    signature: &str,
) -> Result<(), BallotError> {
    let signer = recover_signer(&ballot_digest(message, chain_id), signature)?;
    if signer != *voter {
        debug!("Ballot signed by {} but voter is {}", signer, voter);
        return Err(BallotError::Unauthorized("Signature couldn't be verified"));
    }
    Ok(())
}

/// Sign a 32-byte digest, returning a `0x` hex `r || s || v` signature with `v` in {27, 28}.
pub fn sign_digest(secret_key: &SecretKey, digest: &[u8; 32]) -> Result<String, BallotError> {
    let message = Message::from_digest_slice(digest)
        .map_err(|e| BallotError::InvalidSignature(e.to_string()))?;
    let signature = Secp256k1::signing_only().sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut bytes = Vec::with_capacity(65);
    bytes.extend_from_slice(&compact);
    bytes.push(27 + recovery_id.to_i32() as u8);
    Ok(format!("0x{}", hex::encode(bytes)))
}

pub fn sign_ballot(
    secret_key: &SecretKey,
    chain_id: u64,
    message: &BallotMessage,
) -> Result<String, BallotError> {
    sign_digest(secret_key, &ballot_digest(message, chain_id))
}

pub fn sign_personal_message(secret_key: &SecretKey, message: &str) -> Result<String, BallotError> {
    sign_digest(secret_key, &personal_message_digest(message))
}

pub fn parse_secret_key(s: &str) -> Result<SecretKey, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| format!("Invalid hex: {}", e))?;
    SecretKey::from_slice(&bytes).map_err(|e| format!("Invalid secret key: {}", e))
}
