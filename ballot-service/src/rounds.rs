//! Round lookup and admin configuration

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::Utc;
use retro_core::{Address, BallotError, Round};
use tracing::info;

use crate::database::models::{views::RoundView, RoundRecord, VoterRecord};
use crate::database::Database;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{ApproveVotersRequest, ApproveVotersResponse};
use crate::utils::validate_round_id;

/// Fetch a round by id, mapping a missing row to 404.
pub async fn load_round(db: &Database, round_id: &str) -> Result<Round, ApiError> {
    validate_round_id(round_id)?;

    RoundRecord::get(db.pool(), round_id)
        .await?
        .map(|record| record.round)
        .ok_or_else(|| ApiError::NotFound(format!("Round not found: {}", round_id)))
}

/// Handle GET /rounds/{round_id}
pub async fn handle_get_round(
    State(app_state): State<AppState>,
    Path(round_id): Path<String>,
) -> Result<Json<RoundView>, ApiError> {
    info!("GET /rounds/{} - Round requested", round_id);

    let round = load_round(&app_state.db, &round_id).await?;
    let phase = round.phase(Utc::now());
    Ok(Json(RoundView { round, phase }))
}

/// Handle PUT /admin/rounds/{round_id}
pub async fn handle_upsert_round(
    State(app_state): State<AppState>,
    Path(round_id): Path<String>,
    Json(mut round): Json<Round>,
) -> Result<Json<RoundView>, ApiError> {
    info!("PUT /admin/rounds/{} - Round configuration received", round_id);

    validate_round_id(&round_id)?;
    if !round.id.is_empty() && round.id != round_id {
        return Err(ApiError::BadRequest(format!(
            "Round id '{}' does not match path '{}'",
            round.id, round_id
        )));
    }
    round.id = round_id;
    validate_round_config(&round)?;

    RoundRecord::upsert(&round, app_state.db.pool()).await?;
    info!(
        "Round {} stored (calculation={}, chain_id={})",
        round.id, round.calculation, round.chain_id
    );

    let phase = round.phase(Utc::now());
    Ok(Json(RoundView { round, phase }))
}

/// Handle POST /admin/rounds/{round_id}/voters
pub async fn handle_approve_voters(
    State(app_state): State<AppState>,
    Path(round_id): Path<String>,
    Json(request): Json<ApproveVotersRequest>,
) -> Result<Json<ApproveVotersResponse>, ApiError> {
    info!(
        "POST /admin/rounds/{}/voters - Approving {} voters",
        round_id,
        request.voters.len()
    );

    let round = load_round(&app_state.db, &round_id).await?;

    let voters = request
        .voters
        .iter()
        .map(|voter| {
            voter
                .parse::<Address>()
                .map_err(|e| ApiError::BadRequest(format!("Invalid voter '{}': {}", voter, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let now = Utc::now();
    let mut approved = 0;
    for voter in voters {
        let record = VoterRecord {
            round_id: round.id.clone(),
            voter_id: voter.to_string(),
            approved_at: now,
        };
        if record.insert(app_state.db.pool()).await? {
            approved += 1;
        }
    }

    info!("Approved {} new voters for round {}", approved, round.id);
    Ok(Json(ApproveVotersResponse {
        round_id: round.id,
        approved,
    }))
}

fn validate_round_config(round: &Round) -> Result<(), ApiError> {
    let caps = [
        ("max_votes_total", round.max_votes_total),
        ("max_votes_project", round.max_votes_project),
        ("pool_amount", round.pool_amount),
    ];
    for (field, value) in caps {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(BallotError::ConfigurationError(field).into());
            }
        }
    }

    if let (Some(vote_at), Some(result_at)) = (round.vote_at, round.result_at) {
        if result_at < vote_at {
            return Err(BallotError::ConfigurationError("result_at").into());
        }
    }
    Ok(())
}
