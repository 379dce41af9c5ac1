//! HTTP surface of the proxy.
//!
//! Every `/api/*` route answers 200 with a JSON body. Upstream trouble is
//! absorbed into fallback payloads; the front end detects degraded data by
//! its sentinel values, never by status code.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use chrono::Utc;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};

use crate::aggregate::{self, FallbackMode, iso_timestamp};
use crate::config::Config;
use crate::logging::{self, DataSource};
use crate::model::{CombinedPayload, FerryStatusPayload, HealthResponse, WeatherPayload};
use crate::upstream::UpstreamClient;

/// Shared, read-only request state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: Arc<UpstreamClient>,
    pub fallback_mode: FallbackMode,
    pub environment: Arc<str>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let client = UpstreamClient::new(&config.upstream, config.retry.clone())?;
        Ok(AppState {
            client: Arc::new(client),
            fallback_mode: config.fallback_mode,
            environment: Arc::from(config.environment.as_str()),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/ferry", get(ferry_handler))
        .route("/api/weather", get(weather_handler))
        .route("/api/all", get(all_handler))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn ferry_handler(State(state): State<AppState>) -> Json<FerryStatusPayload> {
    logging::info(DataSource::Proxy, Some("/api/ferry"), "fetching ferry data");
    Json(aggregate::ferry_or_fallback(&state.client).await)
}

async fn weather_handler(State(state): State<AppState>) -> Json<WeatherPayload> {
    logging::info(DataSource::Proxy, Some("/api/weather"), "fetching weather data");
    Json(aggregate::weather_or_fallback(&state.client).await)
}

async fn all_handler(State(state): State<AppState>) -> Json<CombinedPayload> {
    logging::info(DataSource::Proxy, Some("/api/all"), "fetching all data");
    Json(aggregate::fetch_all(&state.client, state.fallback_mode).await)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: iso_timestamp(Utc::now()),
        environment: state.environment.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Server lifecycle
// ---------------------------------------------------------------------------

/// Bind the configured port and serve until Ctrl+C or SIGTERM.
pub async fn run(config: Config) -> Result<(), Box<dyn Error + Send + Sync>> {
    let state = AppState::from_config(&config)?;
    let policy = state.client.policy().clone();
    let app = router(state);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(address.as_str()).await?;

    logging::info(
        DataSource::System,
        None,
        &format!("FerryLight proxy running on {}", address),
    );
    logging::info(
        DataSource::System,
        None,
        "API endpoints: GET /api/ferry, GET /api/weather, GET /api/all, GET /api/health",
    );
    logging::info(
        DataSource::System,
        None,
        &format!(
            "Environment: {} (fallback mode {:?})",
            config.environment, config.fallback_mode
        ),
    );
    logging::info(
        DataSource::System,
        None,
        &format!(
            "Upstream retries: up to {} attempts, {}ms base delay, x{} backoff",
            policy.max_attempts(),
            policy.base_delay.as_millis(),
            policy.backoff_multiplier
        ),
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    logging::info(DataSource::System, None, "Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => logging::info(DataSource::System, None, "Received Ctrl+C, shutting down"),
            Err(e) => {
                logging::error(
                    DataSource::System,
                    None,
                    &format!("Failed to install Ctrl+C handler: {}", e),
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                logging::info(DataSource::System, None, "Received terminate signal, shutting down");
            }
            Err(e) => {
                logging::error(
                    DataSource::System,
                    None,
                    &format!("Failed to install signal handler: {}", e),
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
