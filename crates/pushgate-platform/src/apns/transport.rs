//! The HTTP/2 seam between the protocol client and the network.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Transport-level failures. None of these carry an APNs verdict.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Builder message.
        reason: String,
    },

    /// Connecting, sending or reading the response failed.
    #[error("transport failure: {reason}")]
    Connection {
        /// Underlying error message.
        reason: String,
    },
}

/// One `POST /3/device/<token>` exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    /// `api.push.apple.com` or `api.sandbox.push.apple.com`.
    pub host: &'static str,
    /// Device token, the last path segment.
    pub device_token: String,
    /// Provider JWT for `authorization: bearer`.
    pub bearer: String,
    /// App bundle identifier for `apns-topic`.
    pub topic: String,
    /// Serialized JSON payload.
    pub body: Vec<u8>,
}

impl PushRequest {
    /// Full request URL.
    pub fn url(&self) -> String {
        format!("https://{}/3/device/{}", self.host, self.device_token)
    }
}

/// Raw APNs response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushResponse {
    /// HTTP status.
    pub status: u16,
    /// `apns-id` response header.
    pub apns_id: Option<String>,
    /// Response body; empty on success.
    pub body: String,
}

/// Secure HTTP/2 transport to APNs.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Submit one request and wait for the complete response.
    async fn post(&self, request: PushRequest) -> Result<PushResponse, TransportError>;
}

/// [`PushTransport`] over `reqwest` with rustls and the bundled webpki roots.
///
/// Idle connections are never kept, so every exchange opens and closes its
/// own connection.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the HTTP/2 client.
    pub fn new() -> Result<Self, TransportError> {
        // APNs only speaks HTTP/2, and reqwest stays on HTTP/1.1 unless told otherwise.
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .http2_prior_knowledge()
            .pool_max_idle_per_host(0)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::ClientBuild {
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PushTransport for ReqwestTransport {
    async fn post(&self, request: PushRequest) -> Result<PushResponse, TransportError> {
        let url = request.url();
        let response = self
            .client
            .post(&url)
            .header("authorization", format!("bearer {}", request.bearer))
            .header("apns-topic", &request.topic)
            .header("apns-push-type", "alert")
            .header("content-type", "application/json")
            .body(request.body)
            .send()
            .await
            .map_err(|e| TransportError::Connection {
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let apns_id = response
            .headers()
            .get("apns-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        debug!(status, version = ?response.version(), "APNs response headers received");

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connection {
                reason: e.to_string(),
            })?;

        Ok(PushResponse {
            status,
            apns_id,
            body,
        })
    }
}
