//! # pushgate-server
//!
//! Delivery orchestration and the HTTP front end.
//!
//! - **[`orchestrator`]**: serialized single sends and blast fan-out behind one
//!   delivery lock, dispatched as background tasks
//! - **[`server`]**: axum router, shared state, serve loop
//! - **[`handlers`]**: registry administration and push triggers
//! - **[`auth`]**: HTTP Basic authentication middleware
//! - **[`shutdown`]**: cancellation and draining of in-flight deliveries

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod orchestrator;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use orchestrator::{
    BlastError, BlastSummary, DeliveryEngine, DeliveryOrchestrator, DeliveryOutcome, EnqueueError,
    TargetOutcome,
};
pub use server::{AppState, GatewayServer};
pub use shutdown::ShutdownCoordinator;
