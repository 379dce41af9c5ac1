//! Turns raw upstream JSON into the canonical payload types.
//!
//! The upstream flows sometimes wrap their body in a `{ "payload": ... }`
//! envelope and sometimes do not. This is the only place that knows about
//! it; everything downstream gets a `FerryStatusPayload` or a
//! `WeatherPayload` and never re-guesses the shape.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::model::{FerryStatusPayload, WeatherPayload};

/// Strip an optional `payload` envelope.
///
/// Only an object whose `payload` member is itself an object counts as an
/// envelope; anything else is returned as-is.
pub fn unwrap_envelope(raw: Value) -> Value {
    match raw {
        Value::Object(mut map) if map.get("payload").is_some_and(Value::is_object) => {
            map.remove("payload").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn parse<T: DeserializeOwned>(raw: Value) -> Result<T, UpstreamError> {
    serde_json::from_value(unwrap_envelope(raw)).map_err(|e| UpstreamError::Decode(e.to_string()))
}

pub fn normalize_ferry(raw: Value) -> Result<FerryStatusPayload, UpstreamError> {
    parse(raw)
}

pub fn normalize_weather(raw: Value) -> Result<WeatherPayload, UpstreamError> {
    parse(raw)
}

/// Top-level keys expected in a ferry body.
pub const FERRY_KEYS: &[&str] = &["timestamp", "ferryStatus", "directions"];

/// Core readings expected in a weather body.
pub const WEATHER_KEYS: &[&str] = &[
    "dateutc",
    "tempf",
    "humidity",
    "winddir",
    "windspeedmph",
    "baromrelin",
];

/// Expected keys absent from the (unwrapped) body, in `expected` order.
pub fn missing_keys(raw: &Value, expected: &[&str]) -> Vec<String> {
    let body = match raw {
        Value::Object(map) => match map.get("payload") {
            Some(inner @ Value::Object(_)) => inner,
            _ => raw,
        },
        _ => raw,
    };

    expected
        .iter()
        .filter(|key| body.get(**key).is_none())
        .map(|key| key.to_string())
        .collect()
}
