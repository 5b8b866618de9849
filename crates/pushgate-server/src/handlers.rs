//! Route handlers.
//!
//! Registry calls run on the blocking pool. Request bodies use defaulted
//! fields so a missing field surfaces as a 400 from validation rather than a
//! deserialization rejection.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use pushgate_core::{ArgumentError, Environment, TokenEntry};
use pushgate_platform::apns::NotificationTemplate;
use pushgate_store::{RegisterOutcome, RegistryError, TokenRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::errors::ApiError;
use crate::health::{self, HealthResponse};
use crate::server::AppState;

/// `{ip, token, server_type?}`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterBody {
    /// Client IP key.
    pub ip: String,
    /// Device token.
    pub token: String,
    /// Target environment.
    pub server_type: Option<String>,
}

/// `{ip}`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IpBody {
    /// Client IP key.
    pub ip: String,
}

/// `{ip, token}`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlockBody {
    /// Client IP key.
    pub ip: String,
    /// Device token recorded on the block list.
    pub token: String,
}

/// `?server_type=`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// Optional environment filter.
    pub server_type: Option<String>,
}

/// Alert fields shared by `/push` and `/blast`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertBody {
    /// Required alert title.
    pub title: Option<String>,
    /// Required alert body.
    pub body: Option<String>,
    /// Badge count.
    pub badge: Option<u32>,
    /// Sound name.
    pub sound: Option<String>,
    /// Raw JSON fragment merged at the payload root.
    pub custom_payload: Option<String>,
    /// Target environment.
    pub server_type: Option<String>,
}

impl AlertBody {
    fn into_template(self) -> Result<(NotificationTemplate, Option<String>), ArgumentError> {
        let title = self.title.ok_or(ArgumentError::Missing("title"))?;
        let body = self.body.ok_or(ArgumentError::Missing("body"))?;
        let template = NotificationTemplate {
            title,
            body,
            badge: self.badge,
            sound: self.sound,
            custom_payload: self.custom_payload,
        };
        Ok((template, self.server_type))
    }
}

/// `/push` body: a device token plus the alert fields.
#[derive(Debug, Default, Deserialize)]
pub struct PushBody {
    /// Target device token.
    #[serde(default)]
    pub device_token: String,
    /// Alert fields.
    #[serde(flatten)]
    pub alert: AlertBody,
}

/// Registry listing.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// Number of entries.
    pub count: usize,
    /// Entries, each tagged with its environment.
    pub entries: Vec<TokenEntry>,
}

fn environment_or(
    server_type: Option<&str>,
    default: Environment,
) -> Result<Environment, ArgumentError> {
    server_type.map_or(Ok(default), str::parse)
}

fn ok() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn queued() -> (StatusCode, Json<Value>) {
    (StatusCode::ACCEPTED, Json(json!({ "status": "queued" })))
}

async fn with_registry<T, F>(registry: &TokenRegistry, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&TokenRegistry) -> Result<T, RegistryError> + Send + 'static,
{
    let registry = registry.clone();
    tokio::task::spawn_blocking(move || op(&registry))
        .await
        .map_err(|e| ApiError::Internal(format!("registry task failed: {e}")))?
        .map_err(ApiError::from)
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.shutdown.in_flight(),
    ))
}

/// POST /token
pub async fn register_token(
    State(state): State<AppState>,
    Json(req): Json<RegisterBody>,
) -> Result<Json<Value>, ApiError> {
    let env = environment_or(req.server_type.as_deref(), state.default_environment)?;
    let outcome =
        with_registry(&state.registry, move |r| r.register(env, &req.ip, &req.token)).await?;
    Ok(match outcome {
        RegisterOutcome::Stored => ok(),
        ignored => Json(json!({ "status": "ignored", "reason": ignored.reason() })),
    })
}

/// GET /tokens/send
pub async fn list_send(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let env: Option<Environment> = query.server_type.as_deref().map(str::parse).transpose()?;
    let entries = with_registry(&state.registry, move |r| r.list_send(env)).await?;
    Ok(Json(ListResponse {
        count: entries.len(),
        entries,
    }))
}

/// DELETE /tokens/send
pub async fn delete_send(
    State(state): State<AppState>,
    Json(req): Json<IpBody>,
) -> Result<Json<Value>, ApiError> {
    let _ = with_registry(&state.registry, move |r| r.delete_send(&req.ip)).await?;
    Ok(ok())
}

/// GET /tokens/block
pub async fn list_block(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let env: Option<Environment> = query.server_type.as_deref().map(str::parse).transpose()?;
    let entries = with_registry(&state.registry, move |r| r.list_block(env)).await?;
    Ok(Json(ListResponse {
        count: entries.len(),
        entries,
    }))
}

/// POST /tokens/block
pub async fn add_block(
    State(state): State<AppState>,
    Json(req): Json<BlockBody>,
) -> Result<Json<Value>, ApiError> {
    with_registry(&state.registry, move |r| r.add_block(&req.ip, &req.token)).await?;
    Ok(ok())
}

/// DELETE /tokens/block
pub async fn delete_block(
    State(state): State<AppState>,
    Json(req): Json<IpBody>,
) -> Result<Json<Value>, ApiError> {
    let _ = with_registry(&state.registry, move |r| r.delete_block(&req.ip)).await?;
    Ok(ok())
}

/// POST /tokens/move-to-block
pub async fn move_to_block(
    State(state): State<AppState>,
    Json(req): Json<IpBody>,
) -> Result<Json<Value>, ApiError> {
    let _ = with_registry(&state.registry, move |r| r.move_to_block(&req.ip)).await?;
    Ok(ok())
}

/// POST /tokens/move-to-send
pub async fn move_to_send(
    State(state): State<AppState>,
    Json(req): Json<IpBody>,
) -> Result<Json<Value>, ApiError> {
    let _ = with_registry(&state.registry, move |r| r.move_to_send(&req.ip)).await?;
    Ok(ok())
}

/// POST /push
pub async fn push(
    State(state): State<AppState>,
    Json(req): Json<PushBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (template, server_type) = req.alert.into_template()?;
    let env = environment_or(server_type.as_deref(), state.default_environment)?;
    state
        .orchestrator
        .enqueue_send(template.for_target(&req.device_token, env))?;
    Ok(queued())
}

/// POST /blast
pub async fn blast(
    State(state): State<AppState>,
    Json(req): Json<AlertBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (template, server_type) = req.into_template()?;
    let env = environment_or(server_type.as_deref(), state.default_environment)?;
    state.orchestrator.enqueue_blast(template, env)?;
    Ok(queued())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn environment_defaults_when_absent() {
        assert_eq!(
            environment_or(None, Environment::Production).unwrap(),
            Environment::Production
        );
        assert_eq!(
            environment_or(Some("sandbox"), Environment::Production).unwrap(),
            Environment::Sandbox
        );
        assert_matches!(
            environment_or(Some("staging"), Environment::Sandbox),
            Err(ArgumentError::Invalid { field: "server_type", .. })
        );
    }

    #[test]
    fn alert_requires_title_and_body() {
        let missing_title = AlertBody {
            body: Some("b".into()),
            ..AlertBody::default()
        };
        assert_matches!(missing_title.into_template(), Err(ArgumentError::Missing("title")));

        let missing_body = AlertBody {
            title: Some("t".into()),
            ..AlertBody::default()
        };
        assert_matches!(missing_body.into_template(), Err(ArgumentError::Missing("body")));
    }

    #[test]
    fn push_body_flattens_alert_fields() {
        let body: PushBody = serde_json::from_value(json!({
            "device_token": "abc",
            "title": "T",
            "body": "B",
            "badge": 2,
            "server_type": "production"
        }))
        .unwrap();
        assert_eq!(body.device_token, "abc");
        assert_eq!(body.alert.badge, Some(2));
        assert_eq!(body.alert.server_type.as_deref(), Some("production"));
    }
}
