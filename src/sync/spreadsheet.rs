//! Client for the spreadsheet web app
//!
//! GET `?spreadsheetId=` answers with a JSON array of row objects.
//! POST `?spreadsheetId=&action=` takes a JSON array of change
//! descriptors as `text/plain` and answers with `{message}`.
//! Failures come back as `{status: "error", message}`.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::DomainError;

const USER_AGENT: &str = concat!("bibliolend/", env!("CARGO_PKG_VERSION"));

/// One spreadsheet row, every cell as text
pub type SheetRow = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    pub rows: Vec<SheetRow>,
}

#[derive(Clone)]
pub struct SpreadsheetClient {
    http: reqwest::Client,
    base_url: String,
}

impl SpreadsheetClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DomainError::SyncTransport(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch every row of a sheet
    pub async fn fetch_sheet(&self, sheet_id: &str) -> Result<SheetData, DomainError> {
        tracing::debug!("Fetching sheet {}", sheet_id);

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[("spreadsheetId", sheet_id)])
            .send()
            .await?;
        let status = resp.status();
        let body: Value = resp.json().await?;

        if !status.is_success() || body.get("status").and_then(Value::as_str) == Some("error") {
            return Err(error_from(&body, status));
        }

        let Value::Array(items) = body else {
            return Err(DomainError::SyncTransport(
                "Invalid data format received from the spreadsheet. Expected a JSON array."
                    .to_string(),
            ));
        };

        let rows = items
            .into_iter()
            .map(|item| match item {
                Value::Object(cells) => Ok(cells
                    .into_iter()
                    .map(|(k, v)| (k, cell_text(v)))
                    .collect::<SheetRow>()),
                _ => Err(DomainError::SyncTransport(
                    "Invalid row received from the spreadsheet. Expected an object.".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!("Fetched {} row(s) from sheet {}", rows.len(), sheet_id);
        Ok(SheetData { rows })
    }

    /// Post a batch of change descriptors; returns the server's message
    pub async fn push_changes<T: Serialize>(
        &self,
        sheet_id: &str,
        action: &str,
        changes: &[T],
    ) -> Result<String, DomainError> {
        let body = serde_json::to_string(changes)
            .map_err(|e| DomainError::SyncTransport(format!("Failed to encode changes: {}", e)))?;

        tracing::debug!(
            "Pushing {} change(s) to sheet {} ({})",
            changes.len(),
            sheet_id,
            action
        );

        let resp = self
            .http
            .post(&self.base_url)
            .query(&[("spreadsheetId", sheet_id), ("action", action)])
            .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        let body: Value = resp.json().await?;

        if !status.is_success() || body.get("status").and_then(Value::as_str) == Some("error") {
            return Err(error_from(&body, status));
        }

        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

fn error_from(body: &Value, status: reqwest::StatusCode) -> DomainError {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
    tracing::error!("Spreadsheet request failed: {}", message);
    DomainError::SyncTransport(message)
}

/// Sheets hand back numbers and booleans for cells that look like them
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
