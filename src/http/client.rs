//! HTTP client for the mercado API
//!
//! A thin wrapper around `reqwest` that applies one process-wide timeout and
//! maps transport failures into [`HttpError`].

#![allow(dead_code)]

use reqwest::{header::CONTENT_TYPE, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default timeout applied to every dispatch
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl HttpError {
    /// Whether the server could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        matches!(self, HttpError::ConnectionRefused(_))
    }

    /// Transport errors mean the server answered with something unusable
    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::MalformedResponse { .. })
    }
}

/// Methods the suite dispatches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Methods that carry a request body
    pub fn expects_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP client shared by every case of a run
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpClient {
    /// Create a client rooted at `base_url` with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, HttpError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with a custom process-wide timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Build full URL
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url.trim_end_matches('/'), path)
        } else {
            format!("{}/{}", self.base_url.trim_end_matches('/'), path)
        }
    }

    /// Send HTTP request. Exactly one network call, no retries.
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = self.build_url(&request.url);
        reqwest::Url::parse(&url).map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))?;
        debug!("Sending {} request to {}", request.method, url);

        let mut req_builder = self.client.request(request.method.into(), &url);

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.json(body);
        }

        let start = std::time::Instant::now();

        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                HttpError::ConnectionRefused(url.clone())
            } else {
                HttpError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();

        let mut headers = BTreeMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let declares_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("json"))
            .unwrap_or(false);

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(self.timeout_secs)
            } else {
                HttpError::MalformedResponse {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;

        let json = parse_body(&text, declares_json).map_err(|reason| {
            HttpError::MalformedResponse {
                url: url.clone(),
                reason,
            }
        })?;

        debug!(
            "Response: {} {} in {}ms",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            duration_ms
        );

        Ok(HttpResponse {
            status_code: status.as_u16(),
            headers,
            body: text,
            json,
            duration_ms,
        })
    }
}

/// Parse a response body. A body that claims to be JSON must parse; anything
/// else is parsed opportunistically.
fn parse_body(text: &str, declares_json: bool) -> Result<Option<Value>, String> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(Some(value)),
        Err(e) if declares_json => Err(format!("invalid JSON body: {e}")),
        Err(_) => Ok(None),
    }
}

/// HTTP request description
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub json: Option<Value>,
    pub duration_ms: u64,
}
