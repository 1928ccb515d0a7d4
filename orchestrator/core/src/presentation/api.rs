// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # HTTP API
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | liveness and uptime |
//! | GET | `/api/services` | all services, status freshly probed |
//! | POST | `/api/services` | create or replace a service |
//! | DELETE | `/api/services/{id}` | remove a service |
//! | POST | `/api/services/{id}/action?type=` | `start`, `stop`, `restart`, or `update` (handshake only) |
//! | GET | `/api/services/{id}/logs` | last 100 log lines |
//! | GET | `/api/ws/deploy/{id}` | WebSocket; runs the update pipeline and streams progress |
//!
//! Errors are returned as `{"error": "<message>"}`.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::application::lifecycle::{LifecycleError, ServiceAction, ServiceLifecycle};
use crate::application::registry::RegistryError;
use crate::domain::progress::{ProgressSink, SinkError};
use crate::domain::service::{ManagedService, ServiceId};

pub struct AppState {
    pub lifecycle: ServiceLifecycle,
    pub start_time: Instant,
}

pub fn app(lifecycle: ServiceLifecycle) -> Router {
    let state = Arc::new(AppState {
        lifecycle,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/services", get(list_services_handler).post(upsert_service_handler))
        .route("/api/services/{id}", delete(delete_service_handler))
        .route("/api/services/{id}/action", post(service_action_handler))
        .route("/api/services/{id}/logs", get(service_logs_handler))
        .route("/api/ws/deploy/{id}", get(deploy_ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP-facing error: a status code and a message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "Request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let status = match &err {
            RegistryError::ServiceNotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::InvalidService(_) => StatusCode::BAD_REQUEST,
            RegistryError::ProviderNotFound(_) | RegistryError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::ServiceNotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "service not found"),
            LifecycleError::ProviderNotFound(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "provider not found")
            }
            LifecycleError::Registry(e) => e.into(),
            LifecycleError::Provider(e) => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn list_services_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ManagedService>> {
    Json(state.lifecycle.registry().list().await)
}

async fn upsert_service_handler(
    State(state): State<Arc<AppState>>,
    Json(service): Json<ManagedService>,
) -> Result<Json<ManagedService>, ApiError> {
    state.lifecycle.registry().upsert(service.clone())?;
    Ok(Json(service))
}

async fn delete_service_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.lifecycle.registry().delete(&ServiceId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    #[serde(rename = "type", default)]
    pub action: String,
}

async fn service_action_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ActionQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = ServiceId::new(id);
    state.lifecycle.resolve(&id)?;

    if query.action == "update" {
        return Ok(Json(json!({ "status": "ready_for_ws" })));
    }

    let action: ServiceAction = query
        .action
        .parse()
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "invalid action"))?;

    state.lifecycle.perform(&id, action).await?;
    Ok(Json(json!({ "status": "success" })))
}

async fn service_logs_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let lines = state.lifecycle.logs(&ServiceId::new(id)).await?;
    Ok(Json(json!({ "lines": lines })))
}

async fn deploy_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| run_deploy(socket, state, ServiceId::new(id)))
}

/// Progress sink writing one text message per line to a WebSocket.
pub struct WebSocketSink {
    socket: Mutex<WebSocket>,
}

impl WebSocketSink {
    pub fn new(socket: WebSocket) -> Self {
        Self {
            socket: Mutex::new(socket),
        }
    }

    async fn close(self) {
        let mut socket = self.socket.into_inner();
        socket.send(Message::Close(None)).await.ok();
    }
}

#[async_trait]
impl ProgressSink for WebSocketSink {
    async fn write_line(&self, line: &str) -> Result<(), SinkError> {
        self.socket
            .lock()
            .await
            .send(Message::Text(line.into()))
            .await
            .map_err(|_| SinkError::Closed)
    }
}

async fn run_deploy(socket: WebSocket, state: Arc<AppState>, id: ServiceId) {
    let sink = WebSocketSink::new(socket);
    if let Err(e) = state.lifecycle.deploy(&id, &sink).await {
        warn!(service_id = %id, error = %e, "WebSocket deployment ended with an error");
    }
    sink.close().await;
}
