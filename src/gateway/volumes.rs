use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use bollard::models::Volume;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{body, required, AppState};
use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVolumeRequest {
    volume_name: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Value>> {
    let volumes = state.engine.list_volumes().await?;
    Ok(Json(json!({ "volumes": volumes })))
}

pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateVolumeRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let name = required(body(payload)?.volume_name, "Volume name is required")?;
    let volume = state.engine.create_volume(&name).await?;
    Ok(Json(json!({
        "message": format!("Volume {} created successfully", name),
        "volume": volume,
    })))
}

pub async fn inspect(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Volume>> {
    Ok(Json(state.engine.inspect_volume(&name).await?))
}

pub async fn remove(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Value>> {
    state.engine.remove_volume(&name).await?;
    Ok(Json(json!({
        "message": format!("Volume {} removed successfully", name)
    })))
}

pub async fn prune(State(state): State<AppState>) -> Result<Json<Value>> {
    let result = state.engine.prune_volumes().await?;
    Ok(Json(json!({
        "message": "Unused volumes pruned successfully",
        "result": result,
    })))
}
