//! Shared HTTP client for the map services

use std::time::Duration;

use log::debug;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::tools::AdapterError;

/// Longest error body kept in an `AdapterError::Status`
const MAX_ERROR_BODY: usize = 300;

/// JSON-over-HTTP client with identifying headers and a hard timeout
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
}

impl ServiceClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, AdapterError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// GET `url` with query parameters and decode the JSON body
    pub async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, AdapterError> {
        debug!("GET {} {:?}", url, query);

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body: truncate(body.trim(), MAX_ERROR_BODY),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AdapterError::Malformed(format!("body is not JSON: {}", e)))
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Read a coordinate that services send either as a number or a numeric string
pub(crate) fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
