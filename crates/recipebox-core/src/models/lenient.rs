//! Forgiving deserializers for hand-edited or foreign import files.
//!
//! Imported arrays come from files users edit and share, so ids may be
//! numbers, timestamps may be strings, and any field may be `null`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string or a number; anything else becomes an empty string.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Accept an integer, a float, or a numeric string as epoch milliseconds.
/// Anything that is not a finite number becomes 0.
pub fn millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_millis)),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(float_millis),
        _ => None,
    };
    Ok(number.unwrap_or(0))
}

fn float_millis(f: f64) -> Option<i64> {
    if f.is_finite() {
        Some(f.trunc() as i64)
    } else {
        None
    }
}
