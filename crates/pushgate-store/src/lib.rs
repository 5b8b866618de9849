//! # pushgate-store
//!
//! Durable registry of APNs device tokens keyed by client IP.
//!
//! The key space is two-dimensional: `(list ∈ {send, block}) × (environment ∈
//! {sandbox, production})`, each cell mapping an IP to one device token. All of
//! it lives in a single `push_tokens` table whose primary key is
//! `(list, environment, ip)`.
//!
//! # Architecture
//!
//! - **[`connection`]**: `r2d2` pool with durability pragmas on every connection.
//! - **[`migrations`]**: version-tracked schema, embedded at compile time.
//! - **[`repository`]**: stateless single-cell SQL primitives over `&Connection`.
//! - **[`registry`]**: [`TokenRegistry`], the public operations with guards,
//!   dual-partition semantics and transactional moves.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod registry;
pub mod repository;

pub use connection::{ConnectionConfig, ConnectionPool, new_file, new_in_memory};
pub use errors::{RegistryError, Result};
pub use migrations::run_migrations;
pub use registry::{RegisterOutcome, TokenRegistry};
