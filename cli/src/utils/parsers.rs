use retro_core::{typed_data::parse_secret_key, Calculation};
use secp256k1::SecretKey;

pub fn parse_secret(s: &str) -> Result<SecretKey, String> {
    parse_secret_key(s.trim())
}

pub fn parse_calculation(s: &str) -> Result<Calculation, String> {
    s.parse()
}

pub fn parse_non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("invalid number {s}: {e}"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("expected a non-negative amount, got {}", s));
    }
    Ok(value)
}
