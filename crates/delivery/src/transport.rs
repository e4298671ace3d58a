use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection error - {0}")]
    Connect(String),
    #[error("Request timed out - {0}")]
    Timeout(String),
    #[error("General request error - {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// What came back from one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// One request per call; retrying is the caller's concern.
pub trait Transport: Send + Sync {
    fn submit(&self, body: String) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// POSTs JSON bodies to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, endpoint: endpoint.into() })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn submit(&self, body: String) -> Result<TransportResponse, TransportError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(TransportResponse { status, body })
    }
}
