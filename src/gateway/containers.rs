use axum::extract::rejection::QueryRejection;
use axum::extract::{Json, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bollard::models::{ContainerInspectResponse, HealthStatusEnum};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{query, AppState};
use crate::engine::services::{self, ServiceAction};
use crate::engine::{Transition, DEFAULT_LOG_TAIL};
use crate::error::{Error, Result};

const NO_HEALTH_CHECK: &str = "No Health Check";

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    tail: Option<usize>,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Value>> {
    let containers = state.engine.list_containers().await?;
    Ok(Json(json!({ "containers": containers })))
}

pub async fn inspect(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContainerInspectResponse>> {
    Ok(Json(state.engine.inspect_container(&id).await?))
}

pub async fn health(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let container = state.engine.inspect_container(&id).await?;
    let health = container
        .state
        .and_then(|s| s.health)
        .and_then(|h| h.status)
        .filter(|s| *s != HealthStatusEnum::EMPTY)
        .map(|s| s.to_string())
        .unwrap_or_else(|| NO_HEALTH_CHECK.to_string());
    Ok(Json(json!({ "health": health })))
}

pub async fn logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: std::result::Result<Query<LogsQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let tail = query(params)?.tail.unwrap_or(DEFAULT_LOG_TAIL);
    let logs = state.engine.container_logs(&id, tail).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], logs))
}

pub async fn stats(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    Ok(Json(state.engine.container_stats(&id).await?))
}

pub async fn start(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    Ok(match state.engine.start_container(&id).await? {
        Transition::Changed => Json(json!({ "message": "Container started" })).into_response(),
        Transition::Unchanged => StatusCode::NOT_MODIFIED.into_response(),
    })
}

/// Stopping a container that isn't running answers 304 rather than an error.
pub async fn stop(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    Ok(match state.engine.stop_container(&id).await? {
        Transition::Changed => Json(json!({
            "message": format!("Container {} stopped successfully", id)
        }))
        .into_response(),
        Transition::Unchanged => StatusCode::NOT_MODIFIED.into_response(),
    })
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    state.engine.remove_container(&id).await?;
    Ok(Json(json!({ "message": "Container removed" })))
}

pub async fn services(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let container = state.engine.inspect_container(&id).await?;
    let running = container
        .state
        .and_then(|s| s.running)
        .unwrap_or(false);
    if !running {
        return Err(Error::Conflict("Container is not running".to_string()));
    }
    let out = state.engine.exec(&id, services::list_command()).await?;
    if !out.succeeded() {
        return Err(Error::UpstreamFailure(out.output.trim().to_string()));
    }
    Ok(Json(json!({ "services": services::parse_units(&out.output) })))
}

pub async fn start_service(
    state: State<AppState>,
    Path((id, service)): Path<(String, String)>,
) -> Result<Json<Value>> {
    run_service_action(state, id, service, ServiceAction::Start).await
}

pub async fn stop_service(
    state: State<AppState>,
    Path((id, service)): Path<(String, String)>,
) -> Result<Json<Value>> {
    run_service_action(state, id, service, ServiceAction::Stop).await
}

async fn run_service_action(
    State(state): State<AppState>,
    id: String,
    service: String,
    action: ServiceAction,
) -> Result<Json<Value>> {
    let cmd = services::action_command(action, &service)?;
    let out = state.engine.exec(&id, cmd).await?;
    if !out.succeeded() {
        return Err(Error::UpstreamFailure(out.output.trim().to_string()));
    }
    Ok(Json(json!({
        "message": format!("Service {} {} successfully.", service, action.past_tense())
    })))
}
