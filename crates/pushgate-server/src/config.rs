//! Server configuration.

use std::fmt;

use pushgate_core::Environment;
use pushgate_settings::GatewaySettings;

/// Credentials for HTTP Basic authentication.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BasicCredentials {
    /// Expected user name.
    pub username: String,
    /// Expected password.
    pub password: String,
}

impl BasicCredentials {
    /// Whether both halves are set. Unconfigured credentials reject everyone.
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Configuration for the HTTP front end.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Basic auth credentials for every route except `/health`.
    pub credentials: BasicCredentials,
    /// Environment used when a request omits `server_type`.
    pub default_environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            credentials: BasicCredentials::default(),
            default_environment: Environment::Sandbox,
        }
    }
}

impl ServerConfig {
    /// Derive from loaded settings.
    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            credentials: BasicCredentials {
                username: settings.auth.username.clone(),
                password: settings.auth.password.clone(),
            },
            default_environment: settings.apns.environment,
        }
    }

    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
