use serde::{Deserialize, Serialize, Serializer};

/// Largest integer a JavaScript number represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Voting power allocated to a single project within a ballot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub project_id: String,
    #[serde(serialize_with = "serialize_js_number")]
    pub amount: f64,
}

impl Vote {
    pub fn new(project_id: impl Into<String>, amount: f64) -> Self {
        Self {
            project_id: project_id.into(),
            amount,
        }
    }
}

/// Sum of all amounts in a vote list.
pub fn sum_votes(votes: &[Vote]) -> f64 {
    votes.iter().map(|vote| vote.amount).sum()
}

/// Render a number the way `JSON.stringify` does (ECMAScript Number::toString):
/// shortest round-trip digits, decimal notation for magnitudes in [1e-6, 1e21),
/// `e+`/`e-` exponents otherwise, and `null` for non-finite values.
pub fn js_number(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "1.5e-6".
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}", sign, place_decimal_point(&digits, exponent + 1))
}

/// `digits` scaled so the decimal point sits after `n` of them.
fn place_decimal_point(digits: &str, n: i32) -> String {
    let k = digits.len() as i32;
    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat(n.unsigned_abs() as usize), digits)
    } else {
        let e = n - 1;
        let e_sign = if e < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, e_sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, e_sign, e.abs())
        }
    }
}

fn serialize_js_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
