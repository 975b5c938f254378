//! Screenshot Rendering Service
//!
//! Client for the remote service that renders a page and hosts the resulting
//! image. One `POST {url}` returns where the image can be fetched and until
//! when it stays valid.

use crate::clock::parse_timestamp;
use crate::error::CaptureError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default rendering endpoint
pub const DEFAULT_SCREENSHOT_ENDPOINT: &str =
    "https://h7iqvn4842.execute-api.us-east-2.amazonaws.com/prod/screenshot";

/// A rendered screenshot as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedScreenshot {
    /// Where the rendered image can be downloaded
    pub url: String,
    /// When the hosted image expires, verbatim from the service
    pub expires: String,
}

/// Screenshot rendering client trait
#[async_trait]
pub trait ScreenshotService: Send + Sync {
    /// Render `url` and report where the image lives
    async fn capture(&self, url: &str) -> Result<RenderedScreenshot, CaptureError>;
}

#[derive(Serialize)]
struct ScreenshotRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ScreenshotResponse {
    url: Option<String>,
    expires: Option<serde_json::Value>,
}

// Helper function to map transport errors to CaptureError
fn map_http_error(error: reqwest::Error) -> CaptureError {
    if error.is_timeout() {
        CaptureError::UpstreamUnavailable(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        CaptureError::UpstreamUnavailable(format!("Connection error: {}", error))
    } else {
        CaptureError::UpstreamUnavailable(format!("HTTP error: {}", error))
    }
}

/// Build the HTTP client shared by the service and file downloads.
///
/// With `timeout = None` no request timeout is set and a stalled server
/// stalls the request.
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, CaptureError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| CaptureError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

/// HTTP screenshot service client
pub struct HttpScreenshotService {
    client: Client,
    endpoint: String,
}

impl HttpScreenshotService {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, CaptureError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ScreenshotService for HttpScreenshotService {
    async fn capture(&self, url: &str) -> Result<RenderedScreenshot, CaptureError> {
        debug!(endpoint = %self.endpoint, url, "Requesting screenshot");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ScreenshotRequest { url })
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_http_error)?;

        if !status.is_success() {
            return Err(CaptureError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

/// Validate a service response body.
pub fn parse_response(body: &str) -> Result<RenderedScreenshot, CaptureError> {
    let response: ScreenshotResponse = serde_json::from_str(body)
        .map_err(|e| CaptureError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    let url = response
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| CaptureError::MalformedResponse("missing `url`".to_string()))?;

    let expires = match response.expires {
        Some(serde_json::Value::String(expires)) => expires,
        Some(other) => {
            return Err(CaptureError::MalformedResponse(format!(
                "`expires` is not a string: {}",
                other
            )))
        }
        None => return Err(CaptureError::MalformedResponse("missing `expires`".to_string())),
    };

    if parse_timestamp(&expires).is_none() {
        return Err(CaptureError::MalformedResponse(format!(
            "`expires` is not a timestamp: {}",
            expires
        )));
    }

    Ok(RenderedScreenshot { url, expires })
}
