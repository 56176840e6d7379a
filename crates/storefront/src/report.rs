//! Best-effort forwarding of client errors to the local log sidecar.

use bazaar_core::{ErrorReport, ReportedError};
use tracing::{instrument, warn};

use crate::api::ApiError;
use crate::config::ClientConfig;

/// Posts [`ErrorReport`]s to the log sidecar's `/log-error` endpoint.
///
/// Reporting never fails from the caller's point of view: if the sidecar is
/// down the report is only logged locally.
#[derive(Clone)]
pub struct ErrorReporter {
    client: reqwest::Client,
    endpoint: String,
}

impl ErrorReporter {
    /// Create a reporter for the sidecar configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/log-error",
                config.log_server_url.as_str().trim_end_matches('/')
            ),
        })
    }

    /// Report an API failure that happened while doing `context`.
    ///
    /// Returns the message shown to the shopper.
    pub async fn report_api_error(&self, context: &str, error: &ApiError) -> String {
        let message = error.user_message();
        let report = ErrorReport {
            error: ReportedError {
                message: message.clone(),
                stack: Some(format!("{error:?}")),
                response: match error {
                    ApiError::Api { status, message } => {
                        Some(serde_json::json!({"status": status, "message": message}))
                    }
                    _ => None,
                },
            },
            context: context.to_string(),
        };
        self.report(&report).await;
        message
    }

    /// Send a report to the sidecar.
    #[instrument(skip_all, fields(context = %report.context))]
    pub async fn report(&self, report: &ErrorReport) {
        warn!(message = %report.error.message, "Client error");

        match self.client.post(&self.endpoint).json(report).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(%status, body, "Log server rejected error report");
            }
            Err(e) => warn!(error = %e, "Failed to connect to log server"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_built_from_config() {
        let config = ClientConfig::for_api("http://api.test/api").unwrap();
        let reporter = ErrorReporter::new(&config).unwrap();
        assert_eq!(reporter.endpoint, "http://localhost:8000/log-error");
    }

    #[tokio::test]
    async fn test_report_survives_unreachable_server() {
        let mut config = ClientConfig::for_api("http://api.test/api").unwrap();
        config.log_server_url = url::Url::parse("http://127.0.0.1:9").unwrap();
        config.http_timeout = std::time::Duration::from_millis(500);
        let reporter = ErrorReporter::new(&config).unwrap();

        let shown = reporter
            .report_api_error(
                "Placing order",
                &ApiError::Api {
                    status: 409,
                    message: "Stock changed".to_string(),
                },
            )
            .await;
        assert_eq!(shown, "Stock changed");
    }
}
