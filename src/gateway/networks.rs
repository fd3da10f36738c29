use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{body, required, AppState};
use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
pub struct CreateNetworkRequest {
    name: Option<String>,
    driver: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Value>> {
    let networks = state.engine.list_networks().await?;
    Ok(Json(json!({ "networks": networks })))
}

pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateNetworkRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = body(payload)?;
    let name = required(request.name, "Network name is required")?;
    let driver = request
        .driver
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    state
        .engine
        .create_network(&name, driver.as_deref())
        .await?;
    Ok(Json(json!({
        "message": format!("Network {} created successfully.", name)
    })))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    state.engine.remove_network(&id).await?;
    Ok(Json(json!({
        "message": format!("Network {} removed successfully.", id)
    })))
}
