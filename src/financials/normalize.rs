//! Unit normalisation for upstream figures.
//!
//! Rounding is half away from zero (`f64::round`): 1_234_500 becomes 1.235
//! million and -1_234_500 becomes -1.235 million. Anything that is not a
//! finite number normalises to 0.

use serde_json::Value;

use crate::models::Scale;

/// Raw currency units to millions, keeping thousands as the last 3 decimals
pub fn round_to_millions(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value / 1000.0).round() / 1000.0
}

/// Round a ratio, margin or per-share figure to 3 decimals
pub fn round_ratio(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 1000.0).round() / 1000.0
}

pub fn normalize(value: f64, scale: Scale) -> f64 {
    match scale {
        Scale::Millions => round_to_millions(value),
        Scale::Ratio => round_ratio(value),
    }
}

/// Lenient numeric parse: blank or non-numeric text is 0
pub fn parse_lenient(raw: &str) -> f64 {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Vendor payloads carry numbers both as JSON strings and JSON numbers
pub fn numeric_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_lenient(s),
        _ => 0.0,
    }
}
