/// Structured logging for the FerryLight proxy service
///
/// Provides context-rich logging tagged with the data source and the route
/// or endpoint involved. Events go through `tracing`; `init_logger` installs
/// a `tracing-subscriber` formatter whose level can be overridden with
/// `RUST_LOG`.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::error::UpstreamError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warning => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    Ferry,
    Weather,
    Proxy,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Ferry => write!(f, "FERRY"),
            DataSource::Weather => write!(f, "WEATHER"),
            DataSource::Proxy => write!(f, "PROXY"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Transient failure - upstream briefly unreachable or overloaded
    Transient,
    /// Terminal failure - bad credentials, wrong URL, or a changed payload
    Terminal,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Transient => write!(f, "TRANSIENT"),
            FailureType::Terminal => write!(f, "TERMINAL"),
        }
    }
}

/// Classify an upstream failure the same way the retry policy does.
pub fn classify_upstream_failure(err: &UpstreamError) -> FailureType {
    if err.is_retryable() {
        FailureType::Transient
    } else {
        FailureType::Terminal
    }
}

// ---------------------------------------------------------------------------
// Logger Setup
// ---------------------------------------------------------------------------

/// Install the global subscriber. `RUST_LOG`, when set, wins over
/// `min_level`. Calling this twice is harmless; the second call is ignored.
pub fn init_logger(min_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(source: DataSource, context: Option<&str>, message: &str) {
    tracing::info!(source = %source, context = context.unwrap_or("-"), "{}", message);
}

/// Log a warning message
pub fn warn(source: DataSource, context: Option<&str>, message: &str) {
    tracing::warn!(source = %source, context = context.unwrap_or("-"), "{}", message);
}

/// Log an error message
pub fn error(source: DataSource, context: Option<&str>, message: &str) {
    tracing::error!(source = %source, context = context.unwrap_or("-"), "{}", message);
}

/// Log a debug message
pub fn debug(source: DataSource, context: Option<&str>, message: &str) {
    tracing::debug!(source = %source, context = context.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Structured Fetch Logging
// ---------------------------------------------------------------------------

/// Log a successful fetch with its latency.
pub fn log_fetch_success(source: DataSource, url: &str, elapsed_ms: u128) {
    info(
        source,
        Some(url),
        &format!("fetched successfully in {}ms", elapsed_ms),
    );
}

/// Log a fetch that ended in fallback data, with automatic classification.
///
/// Transient failures are warnings (upstream will likely recover on its
/// own); terminal ones are errors because they usually need a config fix.
pub fn log_fetch_failure(source: DataSource, url: &str, elapsed_ms: u128, err: &UpstreamError) {
    let failure_type = classify_upstream_failure(err);
    let status = err
        .status()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string());

    let message = format!(
        "fetch failed [{}] after {}ms (status {}), using fallback data: {}",
        failure_type, elapsed_ms, status, err
    );

    match failure_type {
        FailureType::Transient => warn(source, Some(url), &message),
        FailureType::Terminal => error(source, Some(url), &message),
    }
}

/// Log a summary of an upstream verification run
pub fn log_verification_summary(total: usize, working: usize, failed: usize) {
    let message = format!(
        "Verification complete: {}/{} upstreams working, {} failed",
        working, total, failed
    );

    if failed == 0 {
        info(DataSource::System, None, &message);
    } else if working == 0 {
        error(DataSource::System, None, &message);
    } else {
        warn(DataSource::System, None, &message);
    }
}
