//! Upstream Verification Module
//!
//! Probes the configured ferry and weather endpoints once each (no retry,
//! no fallback) and reports whether they answer, how fast, and whether the
//! body still has the shape the proxy expects.
//!
//! Use this after changing credentials or upstream URLs, before trusting
//! the dashboard's fallback banners.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging;
use crate::normalize::{FERRY_KEYS, WEATHER_KEYS, missing_keys, normalize_ferry, normalize_weather};
use crate::upstream::{Feed, UpstreamClient};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub results: Vec<EndpointVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub working: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointVerification {
    pub name: String,
    pub url: String,
    pub status: VerificationStatus,
    pub http_status: Option<u16>,
    pub response_time_ms: Option<u128>,
    pub data_keys: Vec<String>,
    pub missing_keys: Vec<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    /// Answered 2xx and the body parses into the canonical payload.
    Success,
    /// Answered 2xx with JSON, but the body no longer fits the payload.
    PartialSuccess,
    Failed,
}

// ============================================================================
// Single Endpoint
// ============================================================================

pub async fn verify_endpoint(client: &UpstreamClient, feed: Feed) -> EndpointVerification {
    let mut result = EndpointVerification {
        name: feed.name().to_string(),
        url: client.url_for(feed).to_string(),
        status: VerificationStatus::Failed,
        http_status: None,
        response_time_ms: None,
        data_keys: Vec::new(),
        missing_keys: Vec::new(),
        error_message: None,
    };

    let probe = match client.probe(feed).await {
        Ok(probe) => probe,
        Err(e) => {
            result.error_message = Some(format!("Request failed: {}", e));
            return result;
        }
    };

    result.http_status = Some(probe.status);
    result.response_time_ms = Some(probe.elapsed.as_millis());

    if !(200..300).contains(&probe.status) {
        result.error_message = Some(format!("HTTP {}", probe.status));
        return result;
    }

    let body = match probe.body {
        Ok(body) => body,
        Err(e) => {
            result.error_message = Some(e.to_string());
            return result;
        }
    };

    result.data_keys = top_level_keys(&body);
    let (expected, parsed) = match feed {
        Feed::Ferry => (FERRY_KEYS, normalize_ferry(body.clone()).map(|_| ())),
        Feed::Weather => (WEATHER_KEYS, normalize_weather(body.clone()).map(|_| ())),
    };
    result.missing_keys = missing_keys(&body, expected);

    match parsed {
        Ok(()) => result.status = VerificationStatus::Success,
        Err(e) => {
            result.status = VerificationStatus::PartialSuccess;
            result.error_message = Some(e.to_string());
        }
    }

    result
}

fn top_level_keys(body: &Value) -> Vec<String> {
    body.as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

// ============================================================================
// Full Verification Runner
// ============================================================================

pub async fn run_full_verification(client: &UpstreamClient) -> VerificationReport {
    let mut report = VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        results: Vec::new(),
        summary: VerificationSummary {
            total: 0,
            working: 0,
            failed: 0,
        },
    };

    for feed in Feed::ALL {
        let result = verify_endpoint(client, feed).await;
        match result.status {
            VerificationStatus::Success | VerificationStatus::PartialSuccess => {
                report.summary.working += 1
            }
            VerificationStatus::Failed => report.summary.failed += 1,
        }
        report.summary.total += 1;
        report.results.push(result);
    }

    logging::log_verification_summary(
        report.summary.total,
        report.summary.working,
        report.summary.failed,
    );

    report
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 UPSTREAM VERIFICATION SUMMARY");
    println!("═══════════════════════════════════════════════════════════");

    for result in &report.results {
        let marker = match result.status {
            VerificationStatus::Success => "✓ OK",
            VerificationStatus::PartialSuccess => "⚠ Partial",
            VerificationStatus::Failed => "✗ FAILED",
        };
        println!("\n{} ({})", result.name, result.url);
        println!("  Status: {}", marker);
        if let Some(code) = result.http_status {
            println!("  HTTP: {}", code);
        }
        if let Some(ms) = result.response_time_ms {
            println!("  Response Time: {}ms", ms);
        }
        if !result.data_keys.is_empty() {
            println!("  Keys: {}", result.data_keys.join(", "));
        }
        if !result.missing_keys.is_empty() {
            println!("  Missing: {}", result.missing_keys.join(", "));
        }
        if let Some(error) = &result.error_message {
            println!("  Error: {}", error);
        }
    }

    println!();
    println!(
        "Upstreams: {}/{} working  ({} failed)",
        report.summary.working, report.summary.total, report.summary.failed
    );
    println!("═══════════════════════════════════════════════════════════");
}
