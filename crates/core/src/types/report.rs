//! Wire format for client error reports sent to the log sidecar.

use serde::{Deserialize, Serialize};

/// Body of `POST /log-error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// The failure being reported.
    pub error: ReportedError,
    /// What the client was doing, e.g. "Fetching products".
    #[serde(default)]
    pub context: String,
}

/// Details of a single reported failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedError {
    /// Human readable message.
    pub message: String,
    /// Stack trace or error chain, if the client has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Response body returned by the API, if the failure came from a request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

impl ErrorReport {
    /// Build a report with only a context and message.
    #[must_use]
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ReportedError {
                message: message.into(),
                stack: None,
                response: None,
            },
            context: context.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_body_parses() {
        let report: ErrorReport =
            serde_json::from_str(r#"{"error":{"message":"boom"}}"#).unwrap();
        assert_eq!(report.context, "");
        assert_eq!(report.error.message, "boom");
        assert!(report.error.stack.is_none());
    }

    #[test]
    fn test_optional_fields_skipped() {
        let json = serde_json::to_value(ErrorReport::new("Cart", "failed")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": {"message": "failed"}, "context": "Cart"})
        );
    }
}
