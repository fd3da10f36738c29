use std::convert::Infallible;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, StreamExt};
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{body, query, required, AppState};
use crate::engine::{PullProgress, PullStream};
use crate::error::{Error, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    image_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PullQuery {
    #[serde(default)]
    progress: bool,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Value>> {
    let images = state.engine.list_images().await?;
    Ok(Json(json!({ "images": images })))
}

/// Pulls an image. Without `?progress=true` the response is sent once the pull
/// finished; with it, progress is relayed as server-sent events.
pub async fn pull(
    State(state): State<AppState>,
    params: std::result::Result<Query<PullQuery>, QueryRejection>,
    payload: std::result::Result<Json<PullRequest>, JsonRejection>,
) -> Result<Response> {
    let params = query(params)?;
    let image = required(body(payload)?.image_name, "Image name is required")?;
    let pull = state.engine.pull_image(&image);
    if params.progress {
        return Ok(Sse::new(progress_events(pull, image))
            .keep_alive(KeepAlive::default())
            .into_response());
    }

    let mut pull = pull;
    while let Some(event) = pull.next().await {
        let event = check(event)?;
        debug!("Pull {}: {:?}", image, event);
    }
    Ok(Json(json!({
        "message": format!("Image {} pulled successfully.", image)
    }))
    .into_response())
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    state.engine.remove_image(&id).await?;
    Ok(Json(json!({ "message": "Image removed successfully." })))
}

/// The engine reports some pull failures inline, as a progress event with an error.
fn check(event: Result<PullProgress>) -> Result<PullProgress> {
    let event = event?;
    match &event.error {
        Some(err) => Err(Error::UpstreamFailure(err.clone())),
        None => Ok(event),
    }
}

/// `progress` events, then exactly one final `done` or `error` event.
fn progress_events(
    pull: PullStream,
    image: String,
) -> impl futures::Stream<Item = std::result::Result<Event, Infallible>> {
    stream::unfold(Some(pull), move |pull| {
        let image = image.clone();
        async move {
            let mut pull = pull?;
            let event = match pull.next().await.map(check) {
                Some(Ok(progress)) => {
                    let event = Event::default()
                        .event("progress")
                        .json_data(&progress)
                        .unwrap_or_else(|_| Event::default().event("progress"));
                    return Some((Ok(event), Some(pull)));
                }
                Some(Err(e)) => Event::default().event("error").data(e.to_string()),
                None => Event::default()
                    .event("done")
                    .data(format!("Image {} pulled successfully.", image)),
            };
            Some((Ok(event), None))
        }
    })
}
