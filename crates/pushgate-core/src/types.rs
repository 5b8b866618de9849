//! Domain types shared by the registry, the APNs engine and the front end.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ArgumentError;

/// Maximum IP key length (dotted-quad IPv4).
pub const MAX_IP_LEN: usize = 15;

/// Maximum device token length.
pub const MAX_TOKEN_LEN: usize = 99;

/// APNs delivery environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development builds, `api.sandbox.push.apple.com`.
    #[default]
    Sandbox,
    /// App Store / TestFlight builds, `api.push.apple.com`.
    Production,
}

impl Environment {
    /// Both partitions, sandbox first.
    pub const ALL: [Environment; 2] = [Environment::Sandbox, Environment::Production];

    /// Wire and storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(ArgumentError::Invalid {
                field: "server_type",
                reason: format!("expected \"sandbox\" or \"production\", got {other:?}"),
            }),
        }
    }
}

/// The two registry lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenList {
    /// Active delivery targets.
    Send,
    /// Suppressed targets; registrations for these IPs are ignored.
    Block,
}

impl TokenList {
    /// Storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Block => "block",
        }
    }

    /// The list a move out of `self` lands in.
    pub fn other(self) -> Self {
        match self {
            Self::Send => Self::Block,
            Self::Block => Self::Send,
        }
    }
}

impl fmt::Display for TokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registry row: `(environment, ip) -> token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Partition the entry lives in.
    #[serde(rename = "server_type")]
    pub environment: Environment,
    /// IPv4 address key.
    pub ip: String,
    /// APNs device token.
    pub token: String,
}

/// Process-wide APNs identity, set once at startup and shared read-only.
#[derive(Clone)]
pub struct GatewayIdentity {
    /// Apple Developer Team ID (JWT `iss`).
    pub team_id: String,
    /// Signing key ID (JWT `kid`).
    pub key_id: String,
    /// App bundle identifier, sent as `apns-topic`.
    pub topic: String,
    /// PEM-encoded PKCS#8 P-256 private key (`.p8` contents).
    pub private_key_pem: String,
    /// Environment used when a request does not name one.
    pub default_environment: Environment,
}

impl fmt::Debug for GatewayIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayIdentity")
            .field("team_id", &self.team_id)
            .field("key_id", &self.key_id)
            .field("topic", &self.topic)
            .field("default_environment", &self.default_environment)
            .finish_non_exhaustive()
    }
}
