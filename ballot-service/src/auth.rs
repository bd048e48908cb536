//! Wallet sign-in: nonce issuance and session exchange

use axum::{extract::State, response::Json};
use retro_core::{
    typed_data::{personal_message_digest, recover_signer, sign_in_message},
    Address, BallotError,
};
use tracing::info;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;
use crate::types::{NonceResponse, SessionRequest, SessionResponse};

/// Handle POST /auth/nonce
pub async fn handle_nonce(State(app_state): State<AppState>) -> Json<NonceResponse> {
    let nonce = app_state.sessions.create_nonce();
    info!("POST /auth/nonce - Nonce issued");

    Json(NonceResponse {
        message: sign_in_message(&nonce),
        nonce,
        expires_in: app_state.sessions.nonce_ttl_secs(),
    })
}

/// Handle POST /auth/session
pub async fn handle_session(
    State(app_state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    info!("POST /auth/session - Sign-in requested for {}", request.address);

    let claimed: Address = request
        .address
        .parse()
        .map_err(|e: String| ApiError::BadRequest(format!("Invalid address: {}", e)))?;

    if !app_state.sessions.consume_nonce(&request.nonce) {
        info!("Unknown or expired nonce");
        return Err(BallotError::Unauthorized("Unknown or expired nonce").into());
    }

    let digest = personal_message_digest(&sign_in_message(&request.nonce));
    let signer = recover_signer(&digest, &request.signature)?;
    if signer != claimed {
        info!("Sign-in signature recovered {} instead of {}", signer, claimed);
        return Err(BallotError::Unauthorized("Signature couldn't be verified").into());
    }

    let token = app_state.sessions.create_session(claimed);
    metrics::record_session_created();
    info!("Session created for voter {}", claimed);

    Ok(Json(SessionResponse {
        token,
        voter: claimed.to_string(),
        expires_in: app_state.sessions.session_ttl_secs(),
    }))
}
