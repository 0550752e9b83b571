//! Tolerant field decoders for archive responses.
//!
//! The archive serialises most numbers as strings ("480", "3:45", "1742.0"),
//! and a few fields switch between a scalar and a list depending on the item.
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a duration in seconds, accepting plain seconds or `MM:SS` / `HH:MM:SS`.
pub fn parse_seconds(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.contains(':') {
        raw.split(':').try_fold(0.0, |acc, part| {
            part.trim().parse::<f64>().ok().map(|p| acc * 60.0 + p)
        })
    } else {
        raw.parse().ok()
    }
}

pub fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

/// Flatten a scalar or list metadata value into strings.
pub fn values_of(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(values_of).collect(),
        other => vec![other.to_string()],
    }
}

pub fn opt_seconds<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_seconds(&s),
        _ => None,
    }))
}

pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value
        .as_ref()
        .and_then(int_from_value)
        .and_then(|n| u32::try_from(n).ok()))
}

pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(int_from_value))
}

pub fn i64_field<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    int_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {}", value)))
}

pub fn opt_first_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| values_of(&v).into_iter().next()))
}
