//! Core data types for the FerryLight proxy service.
//!
//! This module defines the payload shapes shared by every other module:
//! what the upstreams send, what the fallback supplier builds, and what the
//! proxy endpoints return. Real and fallback payloads use the same types, so
//! consumers never branch on shape, only on sentinel values.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Sentinel values
// ---------------------------------------------------------------------------

/// `ferryStatus.status` when the ferry payload is placeholder data.
pub const FERRY_UNAVAILABLE: &str = "Service Temporarily Unavailable";

/// `conditions` when the weather payload is placeholder data.
pub const WEATHER_UNAVAILABLE: &str = "Data Unavailable";

/// Direction status reported when no live data backs the direction.
pub const DIRECTION_OFFLINE: &str = "Offline";

/// Wait-time status reported when no live data backs the estimate.
pub const WAIT_UNAVAILABLE: &str = "Unavailable";

// ---------------------------------------------------------------------------
// Ferry payload
// ---------------------------------------------------------------------------

/// Ferry crossing status for both directions of the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FerryStatusPayload {
    /// Human-readable generation time, e.g. "October 18, 2026, 3:04:05 PM".
    pub timestamp: String,
    pub ferry_status: FerryStatus,
    pub directions: Directions,
    /// Fields the ferry flow adds beyond the core shape, e.g.
    /// `ferryDataLastUpdated`. Passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FerryStatusPayload {
    /// True when this payload is placeholder data rather than a live reading.
    pub fn is_degraded(&self) -> bool {
        self.ferry_status.status == FERRY_UNAVAILABLE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FerryStatus {
    pub status: String,
    pub last_updated: String,
    pub region: String,
    pub terminal_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The two fixed crossing directions. A struct rather than a map so the
/// key set can never grow or shrink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directions {
    pub jersey_to_englishtown: DirectionInfo,
    pub englishtown_to_jersey: DirectionInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionInfo {
    pub direction: String,
    #[serde(deserialize_with = "string_or_number")]
    pub travel_time_minutes: String,
    pub google_maps_link: String,
    pub wait_time: WaitTime,
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DirectionInfo {
    pub fn is_offline(&self) -> bool {
        self.status == DIRECTION_OFFLINE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitTime {
    #[serde(deserialize_with = "string_or_number")]
    pub queue_time: String,
    #[serde(deserialize_with = "int_or_string")]
    pub estimated_vehicles: i64,
    #[serde(deserialize_with = "int_or_string")]
    pub ferry_trips_needed: i64,
    #[serde(deserialize_with = "int_or_string")]
    pub wait_time: i64,
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Weather payload
// ---------------------------------------------------------------------------

/// Flat weather station record, field names as the station reports them.
///
/// The core readings are required; the rest are optional and omitted from
/// the output when the station does not report them. Unknown upstream
/// fields are carried through in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    /// Station timestamp, "YYYY-MM-DD HH:MM:SS" in UTC.
    pub dateutc: String,
    pub tempf: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempc: Option<f64>,
    pub humidity: f64,
    pub winddir: f64,
    pub windspeedmph: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windspeedkmh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windgustmph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windgustkmh: Option<f64>,
    pub baromrelin: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baromrelhpa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solarradiation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drain_piezomm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrain_piezomm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yrain_piezomm: Option<f64>,
    #[serde(default)]
    pub conditions: String,
    #[serde(default)]
    pub stationtype: String,
    #[serde(default)]
    pub model: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WeatherPayload {
    pub fn is_degraded(&self) -> bool {
        self.conditions == WEATHER_UNAVAILABLE
    }
}

// ---------------------------------------------------------------------------
// Proxy responses
// ---------------------------------------------------------------------------

/// Body of `/api/all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedPayload {
    pub ferry: FerryStatusPayload,
    pub weather: WeatherPayload,
    /// Assembly time, ISO 8601 UTC with milliseconds.
    pub timestamp: String,
}

/// Body of `/api/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub environment: String,
}

// ---------------------------------------------------------------------------
// Lenient field parsing
// ---------------------------------------------------------------------------

/// Accepts `"12"` or `12` and keeps the value as a string.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl serde::de::Visitor<'_> for StringOrNumber {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

/// Accepts `15`, `15.0` or `"15"` as an integer count.
fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct IntOrString;

    impl serde::de::Visitor<'_> for IntOrString {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer or a string holding one")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom(format!("count {} out of range", v)))
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<i64, E> {
            if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                Ok(v as i64)
            } else {
                Err(E::custom(format!("count {} is not a whole number", v)))
            }
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<i64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::custom(format!("count '{}' is not a number", v)))
        }
    }

    deserializer.deserialize_any(IntOrString)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn direction_json(travel: Value, queue: Value) -> Value {
        json!({
            "direction": "Jersey Cove → Englishtown",
            "travelTimeMinutes": travel,
            "googleMapsLink": "https://www.google.com/maps/dir/a/b",
            "waitTime": {
                "queueTime": queue,
                "estimatedVehicles": 12,
                "ferryTripsNeeded": 2,
                "waitTime": 15,
                "status": "Moderate"
            },
            "status": "Online"
        })
    }

    #[test]
    fn test_direction_accepts_numeric_travel_time() {
        let info: DirectionInfo =
            serde_json::from_value(direction_json(json!(7), json!(12.5))).unwrap();
        assert_eq!(info.travel_time_minutes, "7");
        assert_eq!(info.wait_time.queue_time, "12.5");
        assert!(!info.is_offline());
    }

    #[test]
    fn test_direction_serializes_with_camel_case_keys() {
        let info: DirectionInfo =
            serde_json::from_value(direction_json(json!("7"), json!("3"))).unwrap();
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["travelTimeMinutes"], "7");
        assert_eq!(value["waitTime"]["ferryTripsNeeded"], 2);
        assert!(value.get("travel_time_minutes").is_none());
    }

    #[test]
    fn test_directions_reject_missing_key() {
        let partial = json!({ "jerseyToEnglishtown": direction_json(json!("7"), json!("3")) });
        assert!(serde_json::from_value::<Directions>(partial).is_err());
    }

    #[test]
    fn test_weather_keeps_unknown_fields() {
        let raw = json!({
            "dateutc": "2026-10-18 15:04:05",
            "tempf": 51.2,
            "humidity": 80,
            "winddir": 270,
            "windspeedmph": 12.3,
            "baromrelin": 29.8,
            "feelslikef": 47.0
        });
        let weather: WeatherPayload = serde_json::from_value(raw).unwrap();
        assert_eq!(weather.extra["feelslikef"], json!(47.0));
        assert_eq!(weather.conditions, "");
        assert!(!weather.is_degraded());

        let out = serde_json::to_value(&weather).unwrap();
        assert_eq!(out["feelslikef"], json!(47.0));
        assert!(out.get("tempc").is_none(), "absent optional readings stay absent");
    }

    #[test]
    fn test_wait_time_counts_accept_strings() {
        let mut raw = direction_json(json!("7"), json!("3"));
        raw["waitTime"]["waitTime"] = json!("15");
        raw["waitTime"]["estimatedVehicles"] = json!(" 12 ");
        raw["waitTime"]["ferryTripsNeeded"] = json!(2.0);

        let info: DirectionInfo = serde_json::from_value(raw).unwrap();
        assert_eq!(info.wait_time.wait_time, 15);
        assert_eq!(info.wait_time.estimated_vehicles, 12);
        assert_eq!(info.wait_time.ferry_trips_needed, 2);
    }

    #[test]
    fn test_wait_time_rejects_non_numeric_count() {
        let mut raw = direction_json(json!("7"), json!("3"));
        raw["waitTime"]["waitTime"] = json!("soon");
        assert!(serde_json::from_value::<DirectionInfo>(raw).is_err());
    }

    #[test]
    fn test_direction_keeps_unknown_fields() {
        let mut raw = direction_json(json!("7"), json!("3"));
        raw["lanes"] = json!(2);
        raw["waitTime"]["trend"] = json!("rising");

        let info: DirectionInfo = serde_json::from_value(raw).unwrap();
        let out = serde_json::to_value(&info).unwrap();
        assert_eq!(out["lanes"], 2);
        assert_eq!(out["waitTime"]["trend"], "rising");
        assert!(out.get("extra").is_none());
    }

    #[test]
    fn test_weather_requires_core_readings() {
        let raw = json!({ "dateutc": "2026-10-18 15:04:05", "humidity": 80 });
        assert!(serde_json::from_value::<WeatherPayload>(raw).is_err());
    }
}
