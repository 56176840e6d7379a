//! Append-only error log on disk.

use std::num::FpCategory;
use std::path::{Path, PathBuf};

use bazaar_core::ErrorReport;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// File name of the log inside the logs directory.
pub const LOG_FILE_NAME: &str = "error.log";

const SEPARATOR: &str = "----------------------------------------";

/// Serializes appends to `<logs_dir>/error.log`.
///
/// Entries from concurrent requests never interleave.
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ErrorLog {
    /// Create a log writing to `error.log` inside `logs_dir`.
    ///
    /// The directory is created if missing.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub fn open(logs_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(logs_dir)?;
        Ok(Self {
            path: logs_dir.join(LOG_FILE_NAME),
            lock: Mutex::new(()),
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one formatted entry for `report`, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or written.
    pub async fn append(&self, report: &ErrorReport) -> std::io::Result<()> {
        let entry = format_entry(report, Utc::now());
        let _guard = self.lock.lock().await;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
}

/// Render a report as a log entry.
///
/// A missing stack is written as `No stack trace`. A missing or falsy response
/// (`null`, `false`, `0`, `""`) is written as `{}`.
#[must_use]
pub fn format_entry(report: &ErrorReport, timestamp: DateTime<Utc>) -> String {
    let stack = report
        .error
        .stack
        .as_deref()
        .filter(|stack| !stack.is_empty())
        .unwrap_or("No stack trace");
    let response = report
        .error
        .response
        .as_ref()
        .filter(|value| !is_falsy(value))
        .map_or_else(
            || "{}".to_string(),
            |value| serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        );

    format!(
        "\n[{}] {}\nMessage: {}\nStack: {}\nResponse: {}\n{SEPARATOR}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        report.context,
        report.error.message,
        stack,
        response,
    )
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(f64::classify) == Some(FpCategory::Zero),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
