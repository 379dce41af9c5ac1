//! Service configuration.
//!
//! Values come from three layers, later layers winning:
//! built-in defaults, an optional TOML file, then environment variables
//! (a `.env` file is loaded first if present). Everything is read once at
//! startup and is immutable afterwards.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::aggregate::FallbackMode;
use crate::error::ConfigError;
use crate::logging::LogLevel;
use crate::retry::RetryPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "./ferrylight.toml";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FERRY_URL: &str = "https://nodered.ferrylight.online/rbferry";
pub const DEFAULT_WEATHER_URL: &str = "https://nodered.ferrylight.online/rbweather";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Upper bounds accepted from config; `Config::validate` rejects larger values.
pub const MAX_RETRIES_LIMIT: u32 = 10;
pub const MAX_BASE_DELAY_MS: u64 = 60_000;
pub const MAX_BACKOFF_MULTIPLIER: u32 = 10;
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    /// Reported by `/api/health`.
    pub environment: String,
    #[serde(deserialize_with = "parse_log_level")]
    pub log_level: LogLevel,
    pub fallback_mode: FallbackMode,
    pub upstream: UpstreamConfig,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub ferry_url: String,
    pub weather_url: String,
    pub username: String,
    pub password: String,
    #[serde(with = "crate::retry::millis")]
    pub request_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            ferry_url: DEFAULT_FERRY_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            username: "demo".to_string(),
            password: "demo".to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            log_level: LogLevel::Info,
            fallback_mode: FallbackMode::default(),
            upstream: UpstreamConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Load `.env`, the config file named by `FERRYLIGHT_CONFIG` (or
    /// `./ferrylight.toml`), then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let path = env::var("FERRYLIGHT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file. A missing file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply environment-style overrides. `lookup` returns the value for a
    /// variable name, if set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = parse_value("PORT", &port)?;
        }
        if let Some(url) = lookup("FERRY_API_URL") {
            self.upstream.ferry_url = url;
        }
        if let Some(url) = lookup("WEATHER_API_URL") {
            self.upstream.weather_url = url;
        }
        if let Some(username) = lookup("API_USERNAME") {
            self.upstream.username = username;
        }
        if let Some(password) = lookup("API_PASSWORD") {
            self.upstream.password = password;
        }
        if let Some(environment) = lookup("APP_ENV") {
            self.environment = environment;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = parse_value("LOG_LEVEL", &level)?;
        }
        if let Some(mode) = lookup("FALLBACK_MODE") {
            self.fallback_mode = parse_value("FALLBACK_MODE", &mode)?;
        }
        Ok(())
    }

    /// Reject retry and timeout settings outside the supported range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let retry = &self.retry;
        if retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(invalid("retry.max_retries", retry.max_retries));
        }
        if retry.base_delay > Duration::from_millis(MAX_BASE_DELAY_MS) {
            return Err(invalid("retry.base_delay", retry.base_delay.as_millis()));
        }
        if retry.backoff_multiplier == 0 || retry.backoff_multiplier > MAX_BACKOFF_MULTIPLIER {
            return Err(invalid("retry.backoff_multiplier", retry.backoff_multiplier));
        }

        let timeout = self.upstream.request_timeout;
        if timeout.is_zero() || timeout > Duration::from_millis(MAX_REQUEST_TIMEOUT_MS) {
            return Err(invalid("upstream.request_timeout", timeout.as_millis()));
        }
        Ok(())
    }
}

fn invalid(key: &str, value: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_deployment_values() {
        let config = Config::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.upstream.ferry_url, "https://nodered.ferrylight.online/rbferry");
        assert_eq!(config.upstream.weather_url, "https://nodered.ferrylight.online/rbweather");
        assert_eq!(config.upstream.request_timeout, Duration::from_millis(15_000));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.fallback_mode, FallbackMode::Joint);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::from_file("/nonexistent/ferrylight.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            port = 8080
            log_level = "debug"
            fallback_mode = "per_source"

            [upstream]
            ferry_url = "http://localhost:1880/rbferry"
            request_timeout = 5000

            [retry]
            max_retries = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.fallback_mode, FallbackMode::PerSource);
        assert_eq!(config.upstream.ferry_url, "http://localhost:1880/rbferry");
        assert_eq!(config.upstream.weather_url, DEFAULT_WEATHER_URL);
        assert_eq!(config.upstream.request_timeout, Duration::from_millis(5000));
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_bad_log_level_in_toml_is_rejected() {
        assert!(Config::from_toml(r#"log_level = "loud""#).is_err());
    }

    #[test]
    fn test_environment_overrides_win() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("PORT", "9000"),
                ("FERRY_API_URL", "http://upstream/ferry"),
                ("API_USERNAME", "admin"),
                ("API_PASSWORD", "s3cret"),
                ("APP_ENV", "production"),
                ("FALLBACK_MODE", "per_source"),
            ]))
            .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.upstream.ferry_url, "http://upstream/ferry");
        assert_eq!(config.upstream.weather_url, DEFAULT_WEATHER_URL);
        assert_eq!(config.upstream.username, "admin");
        assert_eq!(config.upstream.password, "s3cret");
        assert_eq!(config.environment, "production");
        assert_eq!(config.fallback_mode, FallbackMode::PerSource);
    }

    #[test]
    fn test_defaults_pass_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_unbounded_retries_are_rejected() {
        let config = Config::from_toml("[retry]\nmax_retries = 4294967295").unwrap();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, ref value }
                if key == "retry.max_retries" && value == "4294967295"),
            "got {:?}",
            err
        );

        let config = Config::from_toml("[retry]\nmax_retries = 10").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_timeout_is_rejected() {
        let config = Config::from_toml("[upstream]\nrequest_timeout = 3600000").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "upstream.request_timeout"
        ));

        let config = Config::from_toml("[upstream]\nrequest_timeout = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_backoff_multiplier_is_rejected() {
        let config = Config::from_toml("[retry]\nbackoff_multiplier = 0").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "retry.backoff_multiplier"
        ));
    }

    #[test]
    fn test_invalid_port_override_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup_from(&[("PORT", "ninety")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }
}
