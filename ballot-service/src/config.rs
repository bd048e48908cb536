//! Service configuration from environment variables

use crate::database::constants::DEFAULT_DB_PATH;
use crate::utils::env_parse;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_NONCE_TTL_SECS: u64 = 300;
pub const DEFAULT_RATE_LIMIT_REPLENISH_MS: u64 = 100;
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 50;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub db_path: String,
    pub port: u16,
    /// Token expected in `x-admin-token`; admin routes reject everything when unset
    pub admin_token: Option<String>,
    pub session_ttl_secs: u64,
    pub nonce_ttl_secs: u64,
    pub rate_limit_replenish_ms: u64,
    pub rate_limit_burst: u32,
    pub body_limit_bytes: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            port: env_parse("PORT", DEFAULT_PORT),
            admin_token: std::env::var("ADMIN_AUTH_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            session_ttl_secs: env_parse("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
            nonce_ttl_secs: env_parse("NONCE_TTL_SECS", DEFAULT_NONCE_TTL_SECS),
            rate_limit_replenish_ms: env_parse(
                "RATE_LIMIT_REPLENISH_MS",
                DEFAULT_RATE_LIMIT_REPLENISH_MS,
            )
            .max(1),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST", DEFAULT_RATE_LIMIT_BURST).max(1),
            body_limit_bytes: env_parse("BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            port: DEFAULT_PORT,
            admin_token: None,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            nonce_ttl_secs: DEFAULT_NONCE_TTL_SECS,
            rate_limit_replenish_ms: DEFAULT_RATE_LIMIT_REPLENISH_MS,
            rate_limit_burst: DEFAULT_RATE_LIMIT_BURST,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}
