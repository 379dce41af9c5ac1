//! Placeholder payloads served when an upstream cannot be reached.
//!
//! Both builders are pure apart from the injected clock: same `now`, same
//! payload. They return the exact shapes real data uses, with every count
//! zeroed and every status set to a sentinel string.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Map;

use crate::model::{
    DIRECTION_OFFLINE, DirectionInfo, Directions, FERRY_UNAVAILABLE, FerryStatus,
    FerryStatusPayload, WAIT_UNAVAILABLE, WEATHER_UNAVAILABLE, WaitTime, WeatherPayload,
};

pub const REGION: &str = "Cape Breton";
pub const TERMINAL_NAME: &str = "Englishtown";

pub const JERSEY_TO_ENGLISHTOWN_LABEL: &str = "Jersey Cove → Englishtown";
pub const ENGLISHTOWN_TO_JERSEY_LABEL: &str = "Englishtown → Jersey Cove";

const JERSEY_TO_ENGLISHTOWN_MAP: &str = "https://www.google.com/maps/dir/46.30780553485239,-60.54585387501085/46.2874294969484,-60.54020656840666";
const ENGLISHTOWN_TO_JERSEY_MAP: &str = "https://www.google.com/maps/dir/46.28089387880864,-60.544588227215534/46.29023591938331,-60.54164852618175";

/// "October 18, 2026, 3:04:05 PM"
const TIMESTAMP_FORMAT: &str = "%B %-d, %Y, %-I:%M:%S %p";
/// "10/18/2026"
const DATE_FORMAT: &str = "%-m/%-d/%Y";
/// "2026-10-18 15:04:05"
const DATEUTC_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn offline_direction(label: &str, map_link: &str) -> DirectionInfo {
    DirectionInfo {
        direction: label.to_string(),
        travel_time_minutes: "0".to_string(),
        google_maps_link: map_link.to_string(),
        wait_time: WaitTime {
            queue_time: "0".to_string(),
            estimated_vehicles: 0,
            ferry_trips_needed: 0,
            wait_time: 0,
            status: WAIT_UNAVAILABLE.to_string(),
            extra: Map::new(),
        },
        status: DIRECTION_OFFLINE.to_string(),
        extra: Map::new(),
    }
}

/// Ferry payload for "service status unknown", stamped with `now` in the
/// server's local time zone.
pub fn fallback_ferry<Tz>(now: DateTime<Tz>) -> FerryStatusPayload
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    FerryStatusPayload {
        timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        ferry_status: FerryStatus {
            status: FERRY_UNAVAILABLE.to_string(),
            last_updated: now.format(DATE_FORMAT).to_string(),
            region: REGION.to_string(),
            terminal_name: TERMINAL_NAME.to_string(),
            extra: Map::new(),
        },
        directions: Directions {
            jersey_to_englishtown: offline_direction(
                JERSEY_TO_ENGLISHTOWN_LABEL,
                JERSEY_TO_ENGLISHTOWN_MAP,
            ),
            englishtown_to_jersey: offline_direction(
                ENGLISHTOWN_TO_JERSEY_LABEL,
                ENGLISHTOWN_TO_JERSEY_MAP,
            ),
        },
        extra: Map::new(),
    }
}

/// Weather payload marked "Data Unavailable". The readings are mild
/// placeholder values so gauges still render.
pub fn fallback_weather(now: DateTime<Utc>) -> WeatherPayload {
    WeatherPayload {
        dateutc: now.format(DATEUTC_FORMAT).to_string(),
        tempf: 68.0,
        tempc: Some(20.0),
        humidity: 65.0,
        winddir: 180.0,
        windspeedmph: 5.0,
        windspeedkmh: Some(8.0),
        windgustmph: Some(8.0),
        windgustkmh: Some(12.9),
        baromrelin: 29.95,
        baromrelhpa: Some(1014.0),
        uv: Some(0.0),
        solarradiation: Some(0.0),
        drain_piezomm: Some(0.0),
        mrain_piezomm: Some(0.0),
        yrain_piezomm: Some(0.0),
        conditions: WEATHER_UNAVAILABLE.to_string(),
        stationtype: DIRECTION_OFFLINE.to_string(),
        model: "Mock Data".to_string(),
        extra: Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    /// A fixed "now" used across all tests: 2026-10-18 15:04:05 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 15, 4, 5).unwrap()
    }

    #[test]
    fn test_ferry_fallback_has_both_directions_offline_and_zeroed() {
        let ferry = fallback_ferry(fixed_now());
        for info in [&ferry.directions.jersey_to_englishtown, &ferry.directions.englishtown_to_jersey] {
            assert_eq!(info.wait_time.wait_time, 0);
            assert_eq!(info.wait_time.estimated_vehicles, 0);
            assert_eq!(info.wait_time.ferry_trips_needed, 0);
            assert_eq!(info.wait_time.queue_time, "0");
            assert_eq!(info.wait_time.status, "Unavailable");
            assert_eq!(info.status, "Offline");
            assert!(info.is_offline());
        }
        assert!(ferry.is_degraded());
    }

    #[test]
    fn test_ferry_fallback_serializes_exactly_two_direction_keys() {
        let value = serde_json::to_value(fallback_ferry(fixed_now())).unwrap();
        let directions = value["directions"].as_object().unwrap();
        let mut keys: Vec<_> = directions.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["englishtownToJersey", "jerseyToEnglishtown"]);
        assert_eq!(value["ferryStatus"]["status"], "Service Temporarily Unavailable");
        assert_eq!(value["directions"]["jerseyToEnglishtown"]["waitTime"]["waitTime"], 0);
    }

    #[test]
    fn test_ferry_timestamps_use_display_formats() {
        let ferry = fallback_ferry(fixed_now());
        assert_eq!(ferry.timestamp, "October 18, 2026, 3:04:05 PM");
        assert_eq!(ferry.ferry_status.last_updated, "10/18/2026");
    }

    #[test]
    fn test_ferry_timestamp_follows_the_given_offset() {
        let atlantic = FixedOffset::west_opt(3 * 3600).unwrap();
        let ferry = fallback_ferry(fixed_now().with_timezone(&atlantic));
        assert_eq!(ferry.timestamp, "October 18, 2026, 12:04:05 PM");
    }

    #[test]
    fn test_weather_fallback_carries_sentinel() {
        let weather = fallback_weather(fixed_now());
        assert_eq!(weather.conditions, "Data Unavailable");
        assert_eq!(weather.dateutc, "2026-10-18 15:04:05");
        assert!(weather.is_degraded());
    }

    #[test]
    fn test_fallback_is_deterministic_for_a_given_clock() {
        assert_eq!(fallback_ferry(fixed_now()), fallback_ferry(fixed_now()));
        assert_eq!(fallback_weather(fixed_now()), fallback_weather(fixed_now()));
    }

    #[test]
    fn test_fallback_round_trips_through_the_real_parser() {
        // Fallback and live data must be interchangeable for consumers.
        let ferry = serde_json::to_value(fallback_ferry(fixed_now())).unwrap();
        let weather = serde_json::to_value(fallback_weather(fixed_now())).unwrap();
        assert!(serde_json::from_value::<FerryStatusPayload>(ferry).is_ok());
        assert!(serde_json::from_value::<WeatherPayload>(weather).is_ok());
    }
}
