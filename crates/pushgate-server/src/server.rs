//! `GatewayServer`: axum router and serve loop.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use pushgate_core::Environment;
use pushgate_store::TokenRegistry;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::require_basic_auth;
use crate::config::ServerConfig;
use crate::handlers;
use crate::orchestrator::DeliveryOrchestrator;
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Token registry.
    pub registry: TokenRegistry,
    /// Delivery orchestrator.
    pub orchestrator: DeliveryOrchestrator,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Environment used when a request omits `server_type`.
    pub default_environment: Environment,
    /// When the server started.
    pub start_time: Instant,
}

/// The gateway's HTTP front end.
pub struct GatewayServer {
    config: ServerConfig,
    registry: TokenRegistry,
    orchestrator: DeliveryOrchestrator,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl GatewayServer {
    /// Create a new server.
    pub fn new(
        config: ServerConfig,
        registry: TokenRegistry,
        orchestrator: DeliveryOrchestrator,
        shutdown: Arc<ShutdownCoordinator>,
    ) -> Self {
        Self {
            config,
            registry,
            orchestrator,
            shutdown,
            start_time: Instant::now(),
        }
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            orchestrator: self.orchestrator.clone(),
            shutdown: self.shutdown.clone(),
            default_environment: self.config.default_environment,
            start_time: self.start_time,
        };
        let credentials = Arc::new(self.config.credentials.clone());

        let protected = Router::new()
            .route("/token", post(handlers::register_token))
            .route(
                "/tokens/send",
                get(handlers::list_send).delete(handlers::delete_send),
            )
            .route(
                "/tokens/block",
                get(handlers::list_block)
                    .post(handlers::add_block)
                    .delete(handlers::delete_block),
            )
            .route("/tokens/move-to-block", post(handlers::move_to_block))
            .route("/tokens/move-to-send", post(handlers::move_to_send))
            .route("/push", post(handlers::push))
            .route("/blast", post(handlers::blast))
            .route_layer(middleware::from_fn_with_state(credentials, require_basic_auth));

        Router::new()
            .route("/health", get(handlers::health_handler))
            .merge(protected)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve on `listener` until the shutdown token is cancelled.
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        let token = self.shutdown.token();
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "gateway listening");
        }
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::DeliveryEngine;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pushgate_core::{GatewayIdentity, SystemClock};
    use pushgate_platform::apns::{ApnsClient, PollSettings, ReqwestTransport};
    use pushgate_store::{ConnectionConfig, new_in_memory};
    use tower::ServiceExt;

    fn make_server() -> GatewayServer {
        let registry = TokenRegistry::new(new_in_memory(&ConnectionConfig::default()).unwrap()).unwrap();
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let client = ApnsClient::new(Arc::new(ReqwestTransport::new().unwrap()), PollSettings::default());
        let identity = GatewayIdentity {
            team_id: "TEAM".into(),
            key_id: "KEY".into(),
            topic: "com.example.app".into(),
            private_key_pem: String::new(),
            default_environment: Environment::Sandbox,
        };
        let orchestrator = DeliveryOrchestrator::new(
            identity,
            registry.clone(),
            DeliveryEngine::new(client),
            Arc::new(SystemClock),
            shutdown.clone(),
        );
        GatewayServer::new(ServerConfig::default(), registry, orchestrator, shutdown)
    }

    #[tokio::test]
    async fn health_needs_no_auth() {
        let app = make_server().router();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
    }

    #[tokio::test]
    async fn unconfigured_credentials_lock_everything_else() {
        let app = make_server().router();
        let req = Request::builder().uri("/tokens/send").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key("www-authenticate"));
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = make_server().router();
        let req = Request::builder().uri("/nonexistent").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let server = make_server();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        server.shutdown().shutdown();
        server.serve(listener).await.unwrap();
    }

    #[test]
    fn config_accessible() {
        assert_eq!(make_server().config().port, 8080);
    }
}
