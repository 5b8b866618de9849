//! # pushgate-platform
//!
//! Apple Push Notification service integration.
//!
//! - **Codecs**: DER to raw ECDSA signature conversion, unpadded base64url
//! - **Provider tokens**: ES256 JWT issuance with a 55-minute reuse window
//! - **Delivery**: payload building and the HTTP/2 exchange behind a
//!   [`apns::PushTransport`] seam

#![deny(unsafe_code)]

pub mod apns;
