mod auth;
mod auth_middleware;
mod ballot;
mod config;
mod database;
mod error;
mod metrics;
mod middleware;
mod results;
mod rounds;
mod state;
mod types;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{DefaultBodyLimit, State},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth::{handle_nonce, handle_session};
use auth_middleware::{require_admin, require_session};
use ballot::{handle_get_ballot, handle_publish_ballot, handle_save_ballot};
use config::ServiceConfig;
use database::{constants::CURRENT_SCHEMA_VERSION, migrator::get_current_version, Database};
use error::ApiError;
use results::handle_get_results;
use rounds::{handle_approve_voters, handle_get_round, handle_upsert_round};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Retro Funding Ballot Service");

    let config = ServiceConfig::from_env();
    if config.admin_token.is_none() {
        info!("ADMIN_AUTH_TOKEN not set, admin routes are disabled");
    }

    let db = Database::connect(&config.db_path).await?;
    info!("Database initialized successfully");

    let port = config.port;
    let app = build_router(AppState::new(db, config))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

fn build_router(app_state: AppState) -> anyhow::Result<Router> {
    let governor_config = GovernorConfigBuilder::default()
        .per_millisecond(app_state.config.rate_limit_replenish_ms)
        .burst_size(app_state.config.rate_limit_burst)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit configuration"))?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let voter_routes = Router::new()
        .route(
            "/rounds/{round_id}/ballot",
            get(handle_get_ballot).put(handle_save_ballot),
        )
        .route("/rounds/{round_id}/ballot/publish", post(handle_publish_ballot))
        .route_layer(from_fn_with_state(app_state.clone(), require_session));

    let admin_routes = Router::new()
        .route("/admin/rounds/{round_id}", put(handle_upsert_round))
        .route("/admin/rounds/{round_id}/voters", post(handle_approve_voters))
        .route("/admin/stats", get(get_stats))
        .route_layer(from_fn_with_state(app_state.clone(), require_admin));

    let body_limit = app_state.config.body_limit_bytes;

    Ok(Router::new()
        .route("/healthz", get(health_check))
        .route("/meta", get(get_meta))
        .route("/auth/nonce", post(handle_nonce))
        .route("/auth/session", post(handle_session))
        .route("/rounds/{round_id}", get(handle_get_round))
        .route("/rounds/{round_id}/results", get(handle_get_results))
        .merge(voter_routes)
        .merge(admin_routes)
        .layer(
            // Outermost first; the client IP is resolved before the limiter keys on it
            ServiceBuilder::new()
                .layer(cors)
                .map_response(IntoResponse::into_response)
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(middleware::inject_client_ip))
                .layer(GovernorLayer {
                    config: Arc::new(governor_config),
                })
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app_state))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// Health check endpoint
async fn health_check() -> &'static str {
    info!("GET /healthz - Health check requested");
    "ok"
}

async fn get_meta(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    info!("GET /meta - Metadata requested");

    let schema_version = get_current_version(app_state.db.pool()).await?;
    Ok(Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "git_hash": option_env!("BALLOT_BUILD_GIT_HASH"),
        "build_time_unix": option_env!("BALLOT_BUILD_TIME_UNIX"),
        "schema_version": schema_version,
        "expected_schema_version": CURRENT_SCHEMA_VERSION,
    })))
}

async fn get_stats(State(app_state): State<AppState>) -> Json<Value> {
    info!("GET /admin/stats - Stats requested");
    Json(metrics::snapshot_as_json(&app_state.config.db_path))
}
