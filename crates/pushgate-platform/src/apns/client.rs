//! Protocol client: one notification, one HTTP/2 exchange.
//!
//! APNs answers a successful push with an empty body. Any body is a rejection;
//! a body naming `Unregistered` means the device token is permanently dead.
//! The exchange is polled on a fixed interval for a bounded number of rounds
//! and abandoned (dropping the connection) once the budget runs out.

use std::sync::Arc;
use std::time::Duration;

use pushgate_core::text::{token_prefix, truncate_str};
use pushgate_core::{ArgumentError, GatewayIdentity};
use thiserror::Error;
use tracing::{info, warn};

use super::host_for;
use super::payload::{NotificationRequest, build_payload};
use super::transport::{PushRequest, PushResponse, PushTransport, TransportError};

const UNREGISTERED_MARKER: &str = "Unregistered";

/// Delivery failures for a single target.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request could not be turned into a payload.
    #[error("invalid notification: {0}")]
    InvalidRequest(#[from] ArgumentError),

    /// APNs reports the device token as no longer valid.
    #[error("device token is unregistered")]
    Unregistered,

    /// APNs answered with an error body.
    #[error("rejected by APNs (status {status}): {body}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },

    /// No response inside the polling budget.
    #[error("no response from APNs within {0:?}")]
    Timeout(Duration),

    /// Connecting or exchanging data failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(#[from] TransportError),
}

/// Polling cadence for an in-flight exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Time between rounds.
    pub interval: Duration,
    /// Rounds before giving up.
    pub max_rounds: u32,
}

impl Default for PollSettings {
    /// 150 rounds of 100 ms.
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_rounds: 150,
        }
    }
}

impl PollSettings {
    /// Derive the round count from a total budget and an interval.
    pub fn from_budget(timeout: Duration, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let rounds = timeout.as_millis() / interval.as_millis();
        Self {
            interval,
            max_rounds: u32::try_from(rounds).unwrap_or(u32::MAX).max(1),
        }
    }

    /// Total wall-clock budget.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_rounds
    }
}

/// Sends notifications through a [`PushTransport`].
#[derive(Clone)]
pub struct ApnsClient {
    transport: Arc<dyn PushTransport>,
    poll: PollSettings,
}

impl std::fmt::Debug for ApnsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApnsClient")
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

impl ApnsClient {
    /// Create a client over `transport`.
    pub fn new(transport: Arc<dyn PushTransport>, poll: PollSettings) -> Self {
        Self { transport, poll }
    }

    /// Deliver one notification using `credential` as the bearer token.
    pub async fn deliver(
        &self,
        identity: &GatewayIdentity,
        credential: &str,
        notification: &NotificationRequest,
    ) -> Result<(), DeliveryError> {
        notification.validate()?;
        let payload = build_payload(&notification.template)?;
        let host = host_for(notification.environment);
        let token = token_prefix(&notification.device_token);

        let request = PushRequest {
            host,
            device_token: notification.device_token.clone(),
            bearer: credential.to_owned(),
            topic: identity.topic.clone(),
            body: payload.to_string().into_bytes(),
        };
        info!(host, token = %token, topic = %identity.topic, "APNs request");

        let response = self.poll_exchange(request).await;
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(host, token = %token, error = %e, "APNs exchange failed");
                return Err(e);
            }
        };

        classify(response, &token)
    }

    async fn poll_exchange(&self, request: PushRequest) -> Result<PushResponse, DeliveryError> {
        let exchange = self.transport.post(request);
        tokio::pin!(exchange);

        let mut ticker = tokio::time::interval(self.poll.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately.
        let _ = ticker.tick().await;

        let mut rounds = 0u32;
        loop {
            tokio::select! {
                biased;
                result = &mut exchange => return Ok(result?),
                _ = ticker.tick() => {
                    rounds += 1;
                    if rounds >= self.poll.max_rounds {
                        return Err(DeliveryError::Timeout(self.poll.budget()));
                    }
                }
            }
        }
    }
}

fn classify(response: PushResponse, token: &str) -> Result<(), DeliveryError> {
    let body = response.body.trim();
    if body.is_empty() && (200..300).contains(&response.status) {
        info!(status = response.status, token, apns_id = ?response.apns_id, "APNs send OK");
        return Ok(());
    }

    warn!(
        status = response.status,
        token,
        body = truncate_str(body, 256),
        "APNs send rejected"
    );
    if body.contains(UNREGISTERED_MARKER) {
        return Err(DeliveryError::Unregistered);
    }
    Err(DeliveryError::Rejected {
        status: response.status,
        body: body.to_owned(),
    })
}
