//! Fetches both feeds and assembles the combined dashboard payload.
//!
//! The ferry and weather requests run concurrently on the same task, so a
//! combined fetch takes as long as the slower of the two. Every fetch is
//! timed and logged here; substitution of fallback data also happens here,
//! never in the client.

use std::future::Future;
use std::str::FromStr;
use std::time::Instant;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::Deserialize;

use crate::error::UpstreamError;
use crate::fallback::{fallback_ferry, fallback_weather};
use crate::logging::{self, DataSource};
use crate::model::{CombinedPayload, FerryStatusPayload, WeatherPayload};
use crate::upstream::{Feed, UpstreamClient};

/// How `/api/all` reacts when one of the two feeds fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Any failure replaces both halves with fallback data.
    #[default]
    Joint,
    /// Each half falls back on its own; a healthy feed is kept.
    PerSource,
}

impl FromStr for FallbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "joint" => Ok(FallbackMode::Joint),
            "per_source" | "per-source" => Ok(FallbackMode::PerSource),
            other => Err(format!("unknown fallback mode '{}'", other)),
        }
    }
}

/// ISO 8601 UTC with milliseconds, e.g. "2026-10-18T15:04:05.123Z".
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Await `fetch`, logging latency and outcome against the feed's URL.
async fn timed<T, Fut>(client: &UpstreamClient, feed: Feed, fetch: Fut) -> Result<T, UpstreamError>
where
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let url = client.url_for(feed);
    let started = Instant::now();
    let result = fetch.await;
    let elapsed_ms = started.elapsed().as_millis();

    match &result {
        Ok(_) => logging::log_fetch_success(feed.source(), url, elapsed_ms),
        Err(err) => logging::log_fetch_failure(feed.source(), url, elapsed_ms, err),
    }
    result
}

/// Live ferry data, or the ferry fallback if the fetch failed.
pub async fn ferry_or_fallback(client: &UpstreamClient) -> FerryStatusPayload {
    timed(client, Feed::Ferry, client.fetch_ferry())
        .await
        .unwrap_or_else(|_| fallback_ferry(Local::now()))
}

/// Live weather data, or the weather fallback if the fetch failed.
pub async fn weather_or_fallback(client: &UpstreamClient) -> WeatherPayload {
    timed(client, Feed::Weather, client.fetch_weather())
        .await
        .unwrap_or_else(|_| fallback_weather(Utc::now()))
}

/// Fetch both feeds concurrently and combine them under `mode`.
pub async fn fetch_all(client: &UpstreamClient, mode: FallbackMode) -> CombinedPayload {
    let started = Instant::now();
    let (ferry, weather) = tokio::join!(
        timed(client, Feed::Ferry, client.fetch_ferry()),
        timed(client, Feed::Weather, client.fetch_weather()),
    );

    let combined = combine(ferry, weather, mode, Utc::now());

    let degraded = combined.ferry.is_degraded() || combined.weather.is_degraded();
    let message = format!(
        "combined fetch finished in {}ms{}",
        started.elapsed().as_millis(),
        if degraded { " with fallback data" } else { "" }
    );
    if degraded {
        logging::warn(DataSource::Proxy, Some("/api/all"), &message);
    } else {
        logging::info(DataSource::Proxy, Some("/api/all"), &message);
    }

    combined
}

/// Join two fetch results into one payload stamped with `now`.
///
/// Under `Joint`, a single failure discards both results; no payload ever
/// mixes live data with placeholders.
pub fn combine(
    ferry: Result<FerryStatusPayload, UpstreamError>,
    weather: Result<WeatherPayload, UpstreamError>,
    mode: FallbackMode,
    now: DateTime<Utc>,
) -> CombinedPayload {
    let (ferry, weather) = match mode {
        FallbackMode::Joint => match (ferry, weather) {
            (Ok(ferry), Ok(weather)) => (ferry, weather),
            _ => (
                fallback_ferry(now.with_timezone(&Local)),
                fallback_weather(now),
            ),
        },
        FallbackMode::PerSource => (
            ferry.unwrap_or_else(|_| fallback_ferry(now.with_timezone(&Local))),
            weather.unwrap_or_else(|_| fallback_weather(now)),
        ),
    };

    CombinedPayload {
        ferry,
        weather,
        timestamp: iso_timestamp(now),
    }
}
