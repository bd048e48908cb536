//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use retro_core::BallotError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ballot(#[from] BallotError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Missing or expired session")]
    Unauthenticated,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ballot(err) => match err {
                BallotError::ConfigurationError(_)
                | BallotError::CapExceeded { .. }
                | BallotError::InvalidAmount { .. }
                | BallotError::DuplicateProject(_)
                | BallotError::HashMismatch => StatusCode::BAD_REQUEST,
                BallotError::VotingClosed
                | BallotError::AlreadyPublished
                | BallotError::ResultsNotReady => StatusCode::FORBIDDEN,
                BallotError::Unauthorized(_) | BallotError::InvalidSignature(_) => {
                    StatusCode::UNAUTHORIZED
                }
            },
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code, also used as the metrics outcome label.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Ballot(err) => err.kind(),
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.kind(),
            "message": message,
        }));
        (self.status(), body).into_response()
    }
}
