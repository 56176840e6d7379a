//! Bazaar Log Server - Local sidecar for client error reports.
//!
//! Browser and CLI clients post failures to `POST /log-error`; each report is
//! appended to `<logs_dir>/error.log` as a human readable entry.
//!
//! # Routes
//!
//! - `POST /log-error` - Append an [`ErrorReport`] to the log
//! - `GET /health` - Liveness check

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod log_file;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use bazaar_core::ErrorReport;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::instrument;

pub use config::{ConfigError, LogServerConfig};
pub use error::{AppError, Result};
pub use log_file::ErrorLog;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    log: Arc<ErrorLog>,
}

impl AppState {
    /// Open the error log inside `config.logs_dir`.
    ///
    /// # Errors
    ///
    /// Returns error if the logs directory cannot be created.
    pub fn new(config: &LogServerConfig) -> std::io::Result<Self> {
        Ok(Self {
            log: Arc::new(ErrorLog::open(&config.logs_dir)?),
        })
    }

    /// The log reports are written to.
    #[must_use]
    pub fn log(&self) -> &ErrorLog {
        &self.log
    }
}

/// Build the router with CORS for the configured origin.
pub fn app(state: AppState, config: &LogServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(config.allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/log-error", post(log_error))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Serialize)]
struct LogResponse {
    success: bool,
}

/// Append a client error report to the log.
#[instrument(skip_all)]
async fn log_error(
    State(state): State<AppState>,
    Json(report): Json<ErrorReport>,
) -> Result<Json<LogResponse>> {
    if report.error.message.is_empty() {
        return Err(AppError::BadRequest("error.message is required".to_string()));
    }

    state.log.append(&report).await?;
    tracing::info!(
        context = %report.context,
        message = %report.error.message,
        "Client error logged"
    );

    Ok(Json(LogResponse { success: true }))
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
