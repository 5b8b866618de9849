//! # pushgate-core
//!
//! Foundation types and utilities shared by every pushgate crate.
//!
//! - **Domain types**: [`types::Environment`], [`types::TokenList`], [`types::TokenEntry`],
//!   [`types::GatewayIdentity`]
//! - **Clock**: [`clock::Clock`] seam for second-resolution wall time
//! - **Errors**: [`errors::ArgumentError`] for requests rejected before any work starts
//! - **Text**: UTF-8 safe truncation used when logging device tokens
//! - **Logging**: [`logging::init_subscriber`] for the global `tracing` subscriber
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other pushgate crates.

#![deny(unsafe_code)]

pub mod clock;
pub mod errors;
pub mod logging;
pub mod text;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::ArgumentError;
pub use types::{Environment, GatewayIdentity, TokenEntry, TokenList};
