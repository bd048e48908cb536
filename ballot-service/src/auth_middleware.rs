//! Authentication middleware for voter and admin routes

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use retro_core::Address;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Authenticated voter, inserted into request extensions by `require_session`
#[derive(Clone, Copy, Debug)]
pub struct Session {
    pub voter: Address,
}

/// Middleware that resolves the bearer token to a live voter session.
pub async fn require_session(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;

    let voter = app_state.sessions.session_voter(token).ok_or_else(|| {
        info!("Invalid or expired session token");
        ApiError::Unauthenticated
    })?;

    debug!("Session resolved for voter {}", voter);
    request.extensions_mut().insert(Session { voter });

    Ok(next.run(request).await)
}

/// Middleware that checks the admin token header against configuration.
pub async fn require_admin(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    match (app_state.config.admin_token.as_deref(), provided) {
        (Some(expected), Some(provided)) if expected == provided => Ok(next.run(request).await),
        _ => {
            info!("Rejected admin request to {}", request.uri().path());
            Err(ApiError::Unauthenticated)
        }
    }
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or(ApiError::Unauthenticated)?
        .to_str()
        .map_err(|_| ApiError::BadRequest("Malformed authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected a Bearer token".to_string()))
}
