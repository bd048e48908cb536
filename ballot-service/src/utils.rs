//! Shared utility functions for the ballot service

use tracing::info;

use crate::error::ApiError;

const MAX_ROUND_ID_LEN: usize = 64;

/// Round ids are path segments: ASCII alphanumerics, `-` and `_` only.
pub fn validate_round_id(round_id: &str) -> Result<(), ApiError> {
    let valid = !round_id.is_empty()
        && round_id.len() <= MAX_ROUND_ID_LEN
        && round_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        info!("Invalid round id '{}'", round_id);
        Err(ApiError::BadRequest(format!("Invalid round id: {}", round_id)))
    }
}

/// Parse an environment variable into a type implementing FromStr, with a default fallback
pub fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_round_id_valid() {
        assert!(validate_round_id("round-1").is_ok());
        assert!(validate_round_id("RetroPGF_3").is_ok());
        assert!(validate_round_id(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_validate_round_id_invalid() {
        assert!(validate_round_id("").is_err());
        assert!(validate_round_id("round 1").is_err());
        assert!(validate_round_id("../etc").is_err());
        assert!(validate_round_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_env_parse_fallback() {
        assert_eq!(env_parse("BALLOT_SERVICE_UNSET_TEST_VAR", 42u16), 42);
    }
}
