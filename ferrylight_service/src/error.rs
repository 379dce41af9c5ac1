//! Error types for upstream fetches and startup configuration.

use std::error::Error as _;
use std::io;

use thiserror::Error;

/// Why a single upstream call failed.
///
/// The variant is the machine-readable kind the retry policy looks at;
/// `HttpStatus` also carries the status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("timeout: upstream did not answer in time")]
    Timeout,

    #[error("name resolution failed: {0}")]
    NameResolution(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    #[error("Parse error: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl UpstreamError {
    /// Transient failures worth another attempt: timeouts, network-level
    /// failures and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Timeout
            | UpstreamError::NameResolution(_)
            | UpstreamError::ConnectionRefused(_)
            | UpstreamError::Network(_) => true,
            UpstreamError::HttpStatus(code) => *code >= 500,
            UpstreamError::Decode(_) | UpstreamError::Request(_) => false,
        }
    }

    /// Upstream HTTP status, when the failure was an HTTP response.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return UpstreamError::Timeout;
        }

        if let Some(status) = err.status() {
            return UpstreamError::HttpStatus(status.as_u16());
        }

        let detail = source_chain(&err);

        if err.is_connect() {
            if io_error_kind(&err) == Some(io::ErrorKind::ConnectionRefused)
                || detail.contains("refused")
            {
                return UpstreamError::ConnectionRefused(detail);
            }
            if detail.contains("dns error") || detail.contains("lookup address") {
                return UpstreamError::NameResolution(detail);
            }
            return UpstreamError::Network(detail);
        }

        if err.is_decode() {
            return UpstreamError::Decode(detail);
        }

        if err.is_request() || err.is_body() {
            return UpstreamError::Network(detail);
        }

        UpstreamError::Request(detail)
    }
}

/// Flattens an error and all of its sources into one message.
fn source_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

fn io_error_kind(err: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = inner.source();
    }
    None
}

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
