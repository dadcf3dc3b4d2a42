//! Confidence normalization
//!
//! Models report confidence and viability as numbers, numeric strings or
//! nonsense. Everything confidence-like in the system goes through
//! [`normalize`] so it always lands in [0, 1].

use serde_json::Value;

/// Neutral value used when a model's number cannot be read
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Coerce a raw model value to a confidence in [0, 1].
///
/// Numbers and numeric strings are clamped and booleans read as 1 or 0;
/// anything else (including NaN, null, lists and objects) becomes
/// [`DEFAULT_CONFIDENCE`].
pub fn normalize(raw: Option<&Value>) -> f32 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if !v.is_nan() => clamp(v as f32),
        _ => DEFAULT_CONFIDENCE,
    }
}

/// Parse confidence from text
pub fn normalize_str(raw: &str) -> f32 {
    normalize(Some(&Value::String(raw.to_string())))
}

/// Clamp an already numeric value into [0, 1]; NaN becomes the default
pub fn clamp(value: f32) -> f32 {
    if value.is_nan() {
        DEFAULT_CONFIDENCE
    } else {
        value.clamp(0.0, 1.0)
    }
}
