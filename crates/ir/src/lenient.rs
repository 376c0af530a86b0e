//! Tolerant deserializers for model-produced JSON
//!
//! The draft comes from a language model, so numbers arrive as `"100"` or
//! `18.0`, booleans as `"true"`, and lists as `null`. These helpers accept
//! those spellings and reject anything that cannot be read unambiguously.

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;

/// Optional non-negative integer: `18`, `18.0`, `"18"` or `null`
pub(crate) fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                return u32::try_from(u).map(Some).map_err(de::Error::custom);
            }
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) => {
                    Ok(Some(f as u32))
                }
                _ => Err(de::Error::custom(format!(
                    "expected a non-negative integer, found {n}"
                ))),
            }
        }
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<u32>().map(Some).map_err(|_| {
            de::Error::custom(format!("expected a non-negative integer, found \"{s}\""))
        }),
        Some(other) => Err(de::Error::custom(format!(
            "expected a non-negative integer, found {other}"
        ))),
    }
}

/// Optional boolean: `true`, `"true"`, `1` or `null`
pub(crate) fn opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|f| f != 0.0))),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(Some(true)),
            "false" | "no" | "" => Ok(Some(false)),
            _ => Err(de::Error::custom(format!("expected a boolean, found \"{s}\""))),
        },
        Some(other) => Err(de::Error::custom(format!(
            "expected a boolean, found {other}"
        ))),
    }
}

/// Boolean that defaults to `false` when absent or `null`
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    opt_flag(deserializer).map(Option::unwrap_or_default)
}

/// List that treats `null` like an empty list
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
