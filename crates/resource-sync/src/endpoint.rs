//! # Guarded Write Endpoint
//!
//! Some resources may not be written by the client directly; their updates and deletes go
//! through a privileged server route instead. [`GuardedEndpoint`] is that route's
//! contract and [`HttpEndpoint`] its HTTP implementation:
//!
//! - `PUT {base}/api/{resource}/{id}` with a JSON payload returns the updated record.
//! - `DELETE {base}/api/{resource}/{id}` returns any 2xx on success.
//! - Failures come back as a non-2xx status with a `{ "error": "..." }` body.

use crate::record::{Payload, Record, RecordId};
use crate::resource::ResourceName;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl EndpointError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EndpointError::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for EndpointError {
    fn from(err: reqwest::Error) -> Self {
        EndpointError::Transport(err.to_string())
    }
}

/// Privileged write route for resources the client may not write directly.
#[async_trait]
pub trait GuardedEndpoint: Send + Sync {
    async fn put(
        &self,
        resource: &ResourceName,
        id: &RecordId,
        payload: Payload,
    ) -> Result<Record, EndpointError>;

    async fn delete(&self, resource: &ResourceName, id: &RecordId) -> Result<(), EndpointError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Builds the error for a non-2xx response, preferring the `{ error }` body.
pub(crate) fn error_from_body(status: u16, body: &str) -> EndpointError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "empty error body".to_string(),
        Err(_) => body.trim().to_string(),
    };
    EndpointError::Status { status, message }
}

/// [`GuardedEndpoint`] over HTTP with a bearer session token.
#[derive(Clone)]
pub struct HttpEndpoint {
    client: reqwest::Client,
    base_url: String,
    session_token: String,
}

impl HttpEndpoint {
    pub fn new(
        base_url: &str,
        session_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EndpointError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: session_token.into(),
        })
    }

    fn url(&self, resource: &ResourceName, id: &RecordId) -> String {
        format!("{}/api/{}/{}", self.base_url, resource, id)
    }
}

#[async_trait]
impl GuardedEndpoint for HttpEndpoint {
    #[instrument(skip(self, payload))]
    async fn put(
        &self,
        resource: &ResourceName,
        id: &RecordId,
        payload: Payload,
    ) -> Result<Record, EndpointError> {
        debug!("Sending request");
        let response = self
            .client
            .put(self.url(resource, id))
            .bearer_auth(&self.session_token)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| EndpointError::InvalidResponse(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, resource: &ResourceName, id: &RecordId) -> Result<(), EndpointError> {
        debug!("Sending request");
        let response = self
            .client
            .delete(self.url(resource, id))
            .bearer_auth(&self.session_token)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await?;
        Err(error_from_body(status.as_u16(), &body))
    }
}
