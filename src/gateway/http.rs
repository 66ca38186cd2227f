//! # HTTP Gateway
//!
//! PostgREST-style client for the hosted database:
//!
//! - `POST {base}/rest/v1/rpc/{procedure}` with a JSON argument object
//! - `GET {base}/rest/v1/{table}?select=..&col=op.value&order=..&limit=..&offset=..`
//! - `HEAD {base}/rest/v1/{table}?..` with `Prefer: count=<precision>`, total read
//!   from `Content-Range`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use super::client::{is_identifier, DataGateway};
use super::errors::{GatewayError, GatewayResult};
use super::query::{CountPrecision, TableQuery};

/// Build the process-wide HTTP client shared by both credential tiers
pub fn build_client(timeout: Duration) -> GatewayResult<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| GatewayError::InvalidRequest(format!("http client build failed: {e}")))
}

/// Gateway bound to one base URL and one API key
pub struct HttpGateway {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl HttpGateway {
    /// Create a gateway. The key is sent as both `apikey` and bearer token.
    pub fn new(client: Client, base_url: &str, api_key: &str) -> GatewayResult<Self> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| GatewayError::InvalidRequest(format!("invalid gateway url: {e}")))?;
        if parsed.host_str().is_none() {
            return Err(GatewayError::InvalidRequest(
                "gateway url missing host".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let apikey = HeaderValue::from_str(api_key)
            .map_err(|e| GatewayError::InvalidRequest(format!("invalid api key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| GatewayError::InvalidRequest(format!("invalid api key: {e}")))?;
        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    fn rpc_url(&self, procedure: &str) -> GatewayResult<String> {
        if !is_identifier(procedure) {
            return Err(GatewayError::InvalidRequest(format!(
                "invalid procedure name: {procedure}"
            )));
        }
        Ok(format!("{}/rest/v1/rpc/{}", self.base_url, procedure))
    }

    fn table_url(&self, table: &str) -> GatewayResult<String> {
        if !is_identifier(table) {
            return Err(GatewayError::InvalidRequest(format!(
                "invalid table name: {table}"
            )));
        }
        Ok(format!("{}/rest/v1/{}", self.base_url, table))
    }
}

/// Turn a non-success response into a `Remote` error, preferring the body's `message`
async fn remote_error(response: Response) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    GatewayError::remote(status.as_u16(), remote_message(status, &body))
}

fn remote_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    format!("remote returned status {}", status.as_u16())
}

/// Parse the total out of `Content-Range: 0-24/1234` or `*/1234`
fn parse_content_range_total(header: &str) -> GatewayResult<u64> {
    let total = header
        .rsplit_once('/')
        .map(|(_, total)| total.trim())
        .ok_or_else(|| GatewayError::Decode(format!("malformed content-range: {header}")))?;
    total
        .parse::<u64>()
        .map_err(|_| GatewayError::Decode(format!("content-range has no total: {header}")))
}

#[async_trait]
impl DataGateway for HttpGateway {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn call(&self, procedure: &str, args: Value) -> GatewayResult<Value> {
        let url = self.rpc_url(procedure)?;
        let response = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(&args)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn select(&self, query: &TableQuery) -> GatewayResult<Vec<Value>> {
        let url = self.table_url(&query.table)?;
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .query(&query.to_query_pairs())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        match response.json::<Value>().await? {
            Value::Array(rows) => Ok(rows),
            other => Err(GatewayError::Decode(format!(
                "expected row array, got {}",
                json_kind(&other)
            ))),
        }
    }

    async fn count(&self, query: &TableQuery, precision: CountPrecision) -> GatewayResult<u64> {
        let url = self.table_url(&query.table)?;
        let prefer = HeaderValue::from_str(&format!("count={}", precision.as_str()))
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .head(url)
            .headers(self.headers.clone())
            .header("Prefer", prefer)
            .query(&query.without_pagination().to_query_pairs())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .ok_or_else(|| GatewayError::Decode("count response missing content-range".into()))?
            .to_str()
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        parse_content_range_total(header)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
