//! Ballot read, save and publish

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use chrono::{DateTime, Utc};
use retro_core::{
    typed_data::verify_ballot_signature, validate_ballot, verify_votes_hash, Address, Ballot,
    BallotError, Vote,
};
use tracing::{info, warn};

use crate::auth_middleware::Session;
use crate::database::models::{views::BallotView, BallotRecord, VoterRecord};
use crate::database::Database;
use crate::error::ApiError;
use crate::metrics::{self, BallotAction};
use crate::rounds::load_round;
use crate::state::AppState;
use crate::types::{PublishBallotRequest, SaveBallotRequest};

/// Handle GET /rounds/{round_id}/ballot
pub async fn handle_get_ballot(
    State(app_state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(round_id): Path<String>,
) -> Result<Json<BallotView>, ApiError> {
    info!(
        "GET /rounds/{}/ballot - Ballot requested by {}",
        round_id, session.voter
    );

    let ballot = get_ballot(&app_state.db, &round_id, &session.voter).await?;
    Ok(Json(ballot.into()))
}

/// Handle PUT /rounds/{round_id}/ballot
pub async fn handle_save_ballot(
    State(app_state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(round_id): Path<String>,
    Json(request): Json<SaveBallotRequest>,
) -> Result<Json<BallotView>, ApiError> {
    info!(
        "PUT /rounds/{}/ballot - Save requested by {} ({} votes)",
        round_id,
        session.voter,
        request.votes.len()
    );

    let result = save_ballot(
        &app_state.db,
        &round_id,
        &session.voter,
        request.votes,
        Utc::now(),
    )
    .await;
    record_outcome(BallotAction::Save, &result);

    result.map(|ballot| Json(ballot.into()))
}

/// Handle POST /rounds/{round_id}/ballot/publish
pub async fn handle_publish_ballot(
    State(app_state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(round_id): Path<String>,
    Json(request): Json<PublishBallotRequest>,
) -> Result<Json<BallotView>, ApiError> {
    info!(
        "POST /rounds/{}/ballot/publish - Publish requested by {}",
        round_id, session.voter
    );

    let result = publish_ballot(
        &app_state.db,
        &round_id,
        &session.voter,
        &request,
        Utc::now(),
    )
    .await;
    record_outcome(BallotAction::Publish, &result);

    result.map(|ballot| Json(ballot.into()))
}

fn record_outcome(action: BallotAction, result: &Result<Ballot, ApiError>) {
    match result {
        Ok(_) => metrics::record_ballot_outcome(action, "success"),
        Err(err) => {
            warn!("Ballot {:?} rejected: {}", action, err);
            metrics::record_ballot_outcome(action, err.kind());
        }
    }
}

/// The voter's ballot, or an empty draft if nothing was saved yet.
pub async fn get_ballot(db: &Database, round_id: &str, voter: &Address) -> Result<Ballot, ApiError> {
    let round = load_round(db, round_id).await?;
    let voter_id = voter.to_string();

    Ok(BallotRecord::get(db.pool(), &round.id, &voter_id)
        .await?
        .map(Ballot::from)
        .unwrap_or_else(|| Ballot::draft(voter_id, round.id)))
}

/// Draft/Saved -> Saved. Rejected once the round closes or the ballot is published.
pub async fn save_ballot(
    db: &Database,
    round_id: &str,
    voter: &Address,
    votes: Vec<Vote>,
    now: DateTime<Utc>,
) -> Result<Ballot, ApiError> {
    let round = load_round(db, round_id).await?;
    let voter_id = voter.to_string();

    round.ensure_accepts_ballots(now)?;

    if let Some(existing) = BallotRecord::get(db.pool(), &round.id, &voter_id).await? {
        Ballot::from(existing).ensure_not_published()?;
    }

    validate_ballot(&votes, &round.caps())?;

    // The upsert skips published rows, covering a publish that raced this save.
    if !BallotRecord::save(db.pool(), &round.id, &voter_id, &votes, now).await? {
        return Err(BallotError::AlreadyPublished.into());
    }

    let saved = BallotRecord::get(db.pool(), &round.id, &voter_id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("saved ballot not found")))?;
    Ok(saved.into())
}

/// Saved -> Published, after caps, approval, commitment and signature checks.
pub async fn publish_ballot(
    db: &Database,
    round_id: &str,
    voter: &Address,
    request: &PublishBallotRequest,
    now: DateTime<Utc>,
) -> Result<Ballot, ApiError> {
    let round = load_round(db, round_id).await?;
    let voter_id = voter.to_string();

    let ballot: Ballot = BallotRecord::get(db.pool(), &round.id, &voter_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ballot not found".to_string()))?
        .into();

    round.ensure_accepts_publish(now)?;
    ballot.ensure_not_published()?;
    validate_ballot(&ballot.votes, &round.caps())?;

    if !VoterRecord::is_approved(db.pool(), &round.id, &voter_id).await? {
        return Err(BallotError::Unauthorized("Voter is not approved").into());
    }

    verify_votes_hash(&request.message.hashed_votes, &ballot.votes)?;

    if request.chain_id != round.chain_id {
        info!(
            "Publish for chain {} but round {} runs on chain {}",
            request.chain_id, round.id, round.chain_id
        );
        return Err(BallotError::Unauthorized("Signature is for a different chain").into());
    }
    verify_ballot_signature(voter, round.chain_id, &request.message, &request.signature)?;

    if !BallotRecord::publish(
        db.pool(),
        &round.id,
        &voter_id,
        &ballot.votes,
        &request.signature,
        now,
    )
    .await?
    {
        // Either published concurrently or the votes changed after they were verified.
        let current: Option<Ballot> = BallotRecord::get(db.pool(), &round.id, &voter_id)
            .await?
            .map(Ballot::from);
        return Err(match current {
            Some(current) if current.is_published() => BallotError::AlreadyPublished,
            _ => BallotError::HashMismatch,
        }
        .into());
    }

    info!("Ballot published for voter {} in round {}", voter_id, round.id);

    let published = BallotRecord::get(db.pool(), &round.id, &voter_id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("published ballot not found")))?;
    Ok(published.into())
}
