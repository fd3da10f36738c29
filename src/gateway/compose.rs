use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{body, AppState};
use crate::compose::{ComposeCommand, ComposeProject};
use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    project_dir: Option<String>,
}

fn project(
    state: &AppState,
    payload: std::result::Result<Json<ComposeRequest>, JsonRejection>,
) -> Result<ComposeProject> {
    let dir = body(payload)?.project_dir.unwrap_or_default();
    state.compose.resolve(&dir)
}

pub async fn up(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ComposeRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let project = project(&state, payload)?;
    let stdout = state.compose.run(&project, ComposeCommand::Up).await?;
    Ok(Json(json!({ "message": stdout })))
}

pub async fn down(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ComposeRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let project = project(&state, payload)?;
    let stdout = state.compose.run(&project, ComposeCommand::Down).await?;
    Ok(Json(json!({ "message": stdout })))
}

pub async fn services(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ComposeRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let project = project(&state, payload)?;
    let stdout = state.compose.run(&project, ComposeCommand::Ps).await?;
    Ok(Json(json!({ "services": stdout })))
}
