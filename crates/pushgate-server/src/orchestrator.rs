//! Delivery orchestration.
//!
//! All APNs activity goes through one [`DeliveryEngine`] behind a single async
//! mutex: a single send holds it for credential issue plus one exchange, a
//! blast holds it for the target lookup and the whole fan-out. Triggers are validated up front and
//! then run as detached tasks; their outcomes are reported through the log.

use std::sync::Arc;

use pushgate_core::text::token_prefix;
use pushgate_core::{ArgumentError, Clock, Environment, GatewayIdentity};
use pushgate_platform::apns::{
    ApnsClient, DeliveryError, JwtIssuer, NotificationRequest, NotificationTemplate,
};
use pushgate_store::{RegistryError, TokenRegistry};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::shutdown::ShutdownCoordinator;

/// Why a blast could not start.
#[derive(Debug, Error)]
pub enum BlastError {
    /// The send list could not be read.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The blocking lookup task panicked or was cancelled.
    #[error("target lookup task failed: {0}")]
    Lookup(#[from] tokio::task::JoinError),
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// APNs accepted the notification.
    Delivered,
    /// APNs reports the device token as permanently invalid.
    Unregistered,
    /// Anything else: rejection, timeout, transport or credential failure.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

impl DeliveryOutcome {
    fn from_result(result: Result<(), DeliveryError>) -> Self {
        match result {
            Ok(()) => Self::Delivered,
            Err(DeliveryError::Unregistered) => Self::Unregistered,
            Err(e) => Self::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// A [`DeliveryOutcome`] tagged with its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    /// Registry key of the target, when it came from the send list.
    pub ip: Option<String>,
    /// Device token the notification was addressed to.
    pub device_token: String,
    /// What happened.
    pub outcome: DeliveryOutcome,
}

/// Aggregate result of a blast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlastSummary {
    /// Send-list partition that was targeted.
    pub environment: Environment,
    /// Targets resolved from the send list.
    pub attempted: usize,
    /// Accepted by APNs.
    pub delivered: usize,
    /// Reported unregistered.
    pub unregistered: usize,
    /// Failed for any other reason.
    pub failed: usize,
    /// Per-target outcomes in delivery order.
    pub outcomes: Vec<TargetOutcome>,
}

impl BlastSummary {
    fn new(environment: Environment) -> Self {
        Self {
            environment,
            attempted: 0,
            delivered: 0,
            unregistered: 0,
            failed: 0,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, outcome: TargetOutcome) {
        self.attempted += 1;
        match outcome.outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Unregistered => self.unregistered += 1,
            DeliveryOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Why a trigger was not accepted.
#[derive(Debug, Error)]
pub enum EnqueueError {
    /// The request failed validation.
    #[error(transparent)]
    Invalid(#[from] ArgumentError),
    /// Shutdown has started; no new deliveries are accepted.
    #[error("gateway is shutting down")]
    ShuttingDown,
}

/// The credential cache and the protocol client, used under one lock.
#[derive(Debug)]
pub struct DeliveryEngine {
    issuer: JwtIssuer,
    client: ApnsClient,
}

impl DeliveryEngine {
    /// Create an engine with an empty credential cache.
    pub fn new(client: ApnsClient) -> Self {
        Self {
            issuer: JwtIssuer::new(),
            client,
        }
    }

    async fn deliver_one(
        &mut self,
        identity: &GatewayIdentity,
        now: i64,
        notification: &NotificationRequest,
    ) -> DeliveryOutcome {
        let credential = match self.issuer.get_bearer_token(identity, now) {
            Ok(c) => c,
            Err(e) => {
                return DeliveryOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };
        DeliveryOutcome::from_result(self.client.deliver(identity, &credential, notification).await)
    }
}

struct Inner {
    engine: Mutex<DeliveryEngine>,
    identity: GatewayIdentity,
    registry: TokenRegistry,
    clock: Arc<dyn Clock>,
    shutdown: Arc<ShutdownCoordinator>,
}

/// Serializes deliveries and dispatches triggers to background tasks.
#[derive(Clone)]
pub struct DeliveryOrchestrator {
    inner: Arc<Inner>,
}

impl DeliveryOrchestrator {
    /// Create an orchestrator.
    pub fn new(
        identity: GatewayIdentity,
        registry: TokenRegistry,
        engine: DeliveryEngine,
        clock: Arc<dyn Clock>,
        shutdown: Arc<ShutdownCoordinator>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine: Mutex::new(engine),
                identity,
                registry,
                clock,
                shutdown,
            }),
        }
    }

    /// Process-wide APNs identity.
    pub fn identity(&self) -> &GatewayIdentity {
        &self.inner.identity
    }

    /// Deliver one notification now, holding the delivery lock throughout.
    pub async fn send_one(&self, notification: &NotificationRequest) -> TargetOutcome {
        let mut engine = self.inner.engine.lock().await;
        let now = self.inner.clock.now_secs();
        let outcome = engine
            .deliver_one(&self.inner.identity, now, notification)
            .await;
        drop(engine);

        let token = token_prefix(&notification.device_token);
        match &outcome {
            DeliveryOutcome::Delivered => {
                info!(env = %notification.environment, token = %token, "push delivered");
            }
            DeliveryOutcome::Unregistered => {
                warn!(env = %notification.environment, token = %token, "push target unregistered");
            }
            DeliveryOutcome::Failed { reason } => {
                warn!(env = %notification.environment, token = %token, reason, "push failed");
            }
        }

        TargetOutcome {
            ip: None,
            device_token: notification.device_token.clone(),
            outcome,
        }
    }

    /// Deliver `template` to every send-list entry of `environment`.
    ///
    /// One credential serves the whole fan-out. A failing target is recorded
    /// and the loop moves on; if no credential can be issued every target is
    /// recorded as failed without contacting APNs.
    pub async fn blast(
        &self,
        environment: Environment,
        template: &NotificationTemplate,
    ) -> Result<BlastSummary, BlastError> {
        let mut engine = self.inner.engine.lock().await;
        let registry = self.inner.registry.clone();
        let targets =
            tokio::task::spawn_blocking(move || registry.list_send(Some(environment))).await??;
        let now = self.inner.clock.now_secs();
        let credential = engine.issuer.get_bearer_token(&self.inner.identity, now);

        let mut summary = BlastSummary::new(environment);
        for entry in targets {
            let outcome = match &credential {
                Ok(credential) => {
                    let request = template.for_target(&entry.token, environment);
                    DeliveryOutcome::from_result(
                        engine
                            .client
                            .deliver(&self.inner.identity, credential, &request)
                            .await,
                    )
                }
                Err(e) => DeliveryOutcome::Failed {
                    reason: e.to_string(),
                },
            };
            if let DeliveryOutcome::Failed { reason } = &outcome {
                warn!(env = %environment, ip = %entry.ip, reason, "blast target failed");
            }
            summary.record(TargetOutcome {
                ip: Some(entry.ip),
                device_token: entry.token,
                outcome,
            });
        }
        drop(engine);

        info!(
            env = %environment,
            attempted = summary.attempted,
            delivered = summary.delivered,
            unregistered = summary.unregistered,
            failed = summary.failed,
            "blast complete"
        );
        Ok(summary)
    }

    /// Validate and dispatch a single send in the background.
    pub fn enqueue_send(&self, notification: NotificationRequest) -> Result<(), EnqueueError> {
        self.accepting()?;
        notification.validate()?;

        let this = self.clone();
        let handle = tokio::spawn(async move {
            let _ = this.send_one(&notification).await;
        });
        self.inner.shutdown.track(handle);
        Ok(())
    }

    /// Validate and dispatch a blast in the background.
    pub fn enqueue_blast(
        &self,
        template: NotificationTemplate,
        environment: Environment,
    ) -> Result<(), EnqueueError> {
        self.accepting()?;
        template.validate()?;

        let this = self.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = this.blast(environment, &template).await {
                error!(env = %environment, error = %e, "blast aborted, send list unavailable");
            }
        });
        self.inner.shutdown.track(handle);
        Ok(())
    }

    fn accepting(&self) -> Result<(), EnqueueError> {
        if self.inner.shutdown.is_shutting_down() {
            return Err(EnqueueError::ShuttingDown);
        }
        Ok(())
    }
}
