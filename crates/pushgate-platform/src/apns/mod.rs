//! APNs (Apple Push Notification service) module.
//!
//! Token-based provider authentication and HTTP/2 delivery to
//! `api.push.apple.com` / `api.sandbox.push.apple.com`.

pub mod base64url;
pub mod client;
pub mod der;
pub mod jwt;
pub mod payload;
pub mod transport;

pub use base64url::encode_url_safe;
pub use client::{ApnsClient, DeliveryError, PollSettings};
pub use der::{CodecError, decode_der_signature};
pub use jwt::{AuthError, JwtIssuer, TOKEN_CAPACITY, TOKEN_VALIDITY_SECS};
pub use payload::{NotificationRequest, NotificationTemplate, build_payload, parse_custom_payload};
pub use transport::{PushRequest, PushResponse, PushTransport, ReqwestTransport, TransportError};

/// Production APNs host.
pub const PRODUCTION_HOST: &str = "api.push.apple.com";

/// Development APNs host.
pub const SANDBOX_HOST: &str = "api.sandbox.push.apple.com";

/// Host serving `env`.
pub fn host_for(env: pushgate_core::Environment) -> &'static str {
    match env {
        pushgate_core::Environment::Sandbox => SANDBOX_HOST,
        pushgate_core::Environment::Production => PRODUCTION_HOST,
    }
}
