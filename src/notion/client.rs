//! Minimal raw client for the Notion REST API.
//!
//! Covers the four endpoints the sink and the dashboard use. Responses
//! stay as `serde_json::Value`; callers pick out the fields they need.

use crate::error::{ClipperError, Result};
use anyhow::Context;
use serde_json::{json, Value};
use std::time::Duration;

const API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct NotionClient {
    http: reqwest::Client,
    api_key: String,
    database_id: String,
}

impl NotionClient {
    /// Builds a client bound to one database. Blank credentials are a
    /// configuration error.
    pub fn new(api_key: &str, database_id: &str) -> Result<Self> {
        let api_key = api_key.trim();
        let database_id = database_id.trim();
        if api_key.is_empty() || database_id.is_empty() {
            return Err(ClipperError::Notion(
                "Notion API key and database id are not configured".to_string(),
            )
            .into());
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building the Notion HTTP client")?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            database_id: database_id.to_string(),
        })
    }

    /// Creates a page in the database and returns the page object.
    pub async fn create_page(&self, properties: Value) -> Result<Value> {
        let body = json!({
            "parent": {"database_id": self.database_id},
            "properties": properties,
        });
        self.send(self.http.post(format!("{API_BASE}/pages")).json(&body))
            .await
    }

    /// Appends child blocks to a page.
    pub async fn append_blocks(&self, block_id: &str, children: Value) -> Result<Value> {
        let body = json!({ "children": children });
        self.send(
            self.http
                .patch(format!("{API_BASE}/blocks/{block_id}/children"))
                .json(&body),
        )
        .await
    }

    /// Runs a database query with the given body (filter, sorts, cursor).
    pub async fn query_database(&self, body: Value) -> Result<Value> {
        self.send(
            self.http
                .post(format!("{API_BASE}/databases/{}/query", self.database_id))
                .json(&body),
        )
        .await
    }

    /// Retrieves the database object. Doubles as the connectivity probe.
    pub async fn retrieve_database(&self) -> Result<Value> {
        self.send(
            self.http
                .get(format!("{API_BASE}/databases/{}", self.database_id)),
        )
        .await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await
            .context("calling the Notion API")?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .context("decoding the Notion API response")?;
        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no error message");
            return Err(ClipperError::Notion(format!("{status}: {message}")).into());
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_rejected() {
        assert!(NotionClient::new("", "db-id").is_err());
        assert!(NotionClient::new("secret_x", "   ").is_err());
        assert!(NotionClient::new("secret_x", "db-id").is_ok());
    }

    #[test]
    fn credentials_are_trimmed() {
        let client = NotionClient::new("  secret_x  ", " db-id ").unwrap();
        assert_eq!(client.api_key, "secret_x");
        assert_eq!(client.database_id, "db-id");
    }
}
