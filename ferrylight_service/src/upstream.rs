/// Upstream API client for the ferry and weather flows.
///
/// Both upstreams are plain HTTP GET endpoints behind Basic auth. The
/// client is built once at startup: credentials are encoded into a default
/// `Authorization` header, and every request carries a fixed timeout. Each
/// logical fetch is wrapped in the retry policy; falling back to placeholder
/// data is the caller's job, not this module's.

use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::error::UpstreamError;
use crate::logging::{self, DataSource};
use crate::model::{FerryStatusPayload, WeatherPayload};
use crate::normalize::{normalize_ferry, normalize_weather};
use crate::retry::RetryPolicy;

// ============================================================================
// Feeds
// ============================================================================

/// The two upstream flows this service proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Ferry,
    Weather,
}

impl Feed {
    pub const ALL: [Feed; 2] = [Feed::Ferry, Feed::Weather];

    pub fn source(self) -> DataSource {
        match self {
            Feed::Ferry => DataSource::Ferry,
            Feed::Weather => DataSource::Weather,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Feed::Ferry => "Ferry API",
            Feed::Weather => "Weather API",
        }
    }
}

// ============================================================================
// Probe result
// ============================================================================

/// Raw outcome of a single, un-retried request. Used by verification.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub elapsed: Duration,
    pub body: Result<Value, UpstreamError>,
}

// ============================================================================
// Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    ferry_url: String,
    weather_url: String,
    policy: RetryPolicy,
}

/// `Basic <base64(username:password)>`
pub fn basic_auth_value(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, policy: RetryPolicy) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut auth = HeaderValue::from_str(&basic_auth_value(&config.username, &config.password))
            .map_err(|e| UpstreamError::Request(format!("invalid credentials header: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(UpstreamClient {
            http,
            ferry_url: config.ferry_url.clone(),
            weather_url: config.weather_url.clone(),
            policy,
        })
    }

    pub fn url_for(&self, feed: Feed) -> &str {
        match feed {
            Feed::Ferry => &self.ferry_url,
            Feed::Weather => &self.weather_url,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Ferry status, retried per policy and normalized.
    pub async fn fetch_ferry(&self) -> Result<FerryStatusPayload, UpstreamError> {
        let raw = self.fetch_json(Feed::Ferry).await?;
        normalize_ferry(raw)
    }

    /// Weather readings, retried per policy and normalized.
    pub async fn fetch_weather(&self) -> Result<WeatherPayload, UpstreamError> {
        let raw = self.fetch_json(Feed::Weather).await?;
        normalize_weather(raw)
    }

    /// GET the source's URL with retries and parse the body as JSON.
    ///
    /// Only the network round-trip is retried; a body that is not JSON is
    /// a terminal `Decode` error.
    pub async fn fetch_json(&self, feed: Feed) -> Result<Value, UpstreamError> {
        let url = self.url_for(feed);
        let bytes = self.policy.run(feed.source(), move || self.get_once(feed, url)).await?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    /// One attempt: send, reject non-2xx, read the whole body.
    async fn get_once(&self, feed: Feed, url: &str) -> Result<Vec<u8>, UpstreamError> {
        logging::debug(feed.source(), Some(url), "GET");
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// A single request with no retry, reporting status and latency even
    /// for error responses.
    pub async fn probe(&self, feed: Feed) -> Result<ProbeResponse, UpstreamError> {
        let url = self.url_for(feed);
        let started = Instant::now();
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();

        let body = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string())),
            Err(e) => Err(UpstreamError::from(e)),
        };

        Ok(ProbeResponse {
            status,
            elapsed: started.elapsed(),
            body,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
