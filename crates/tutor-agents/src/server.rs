//! HTTP service.
//!
//! | Method | Path          | Body / Response                         |
//! |--------|---------------|-----------------------------------------|
//! | POST   | `/v1/answer`  | `Task` → `OrchestratorResult`           |
//! | GET    | `/metrics`    | Prometheus text exposition              |
//! | GET    | `/healthz`    | `{"status": "ok", ...}`                 |

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use coordination::Task;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::contracts::{ErrorCode, OrchestratorResult};
use crate::errors::PipelineError;
use crate::metrics::PipelineMetrics;
use crate::orchestrator::Orchestrator;
use crate::session::{ConversationSession, SessionStore};

/// Application state shared across handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub sessions: SessionStore,
    pub metrics: PipelineMetrics,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, metrics: PipelineMetrics) -> Self {
        Self {
            orchestrator,
            sessions: SessionStore::new(),
            metrics,
            start_time: Instant::now(),
        }
    }
}

pub type AppStateArc = Arc<AppState>;

pub fn router(state: AppStateArc) -> Router {
    Router::new()
        .route("/v1/answer", post(answer))
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn answer(
    State(state): State<AppStateArc>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> (StatusCode, Json<OrchestratorResult>) {
    // Unreadable bodies still get the typed result envelope.
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            let result = state
                .orchestrator
                .reject(PipelineError::MalformedTask(rejection.body_text()));
            return (StatusCode::BAD_REQUEST, Json(result));
        }
    };
    let task: Task = match serde_json::from_value(body) {
        Ok(task) => task,
        Err(e) => {
            let result = state
                .orchestrator
                .reject(PipelineError::MalformedTask(e.to_string()));
            return (StatusCode::BAD_REQUEST, Json(result));
        }
    };

    let result = match task.session_id.as_deref() {
        Some(id) => {
            let session = state.sessions.get_or_create(id).await;
            let mut session = session.lock().await;
            state.orchestrator.run(&task, &mut session).await
        }
        None => {
            let mut session = ConversationSession::ephemeral();
            state.orchestrator.run(&task, &mut session).await
        }
    };

    let status = match result.error_code() {
        Some(ErrorCode::InvalidInput) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    (status, Json(result))
}

async fn metrics(State(state): State<AppStateArc>) -> Response {
    match state.metrics.export() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics export failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn healthz(State(state): State<AppStateArc>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "prompt_version": state.orchestrator.prompt_version(),
        "sessions": state.sessions.len().await,
    }))
}
