//! HTTP surface: one route per engine operation, JSON in and out.

mod compose;
mod containers;
mod images;
mod middleware;
mod networks;
mod volumes;

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::middleware::from_fn;
use axum::routing::{delete, get, post};
use axum::Router;
use log::info;
use tokio::net::TcpListener;

use crate::compose::ComposeRunner;
use crate::engine::Engine;
use crate::error::{Error, Result};

/// Shared by every request. Nothing in here is mutable.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn Engine>,
    pub compose: Arc<ComposeRunner>,
}

impl AppState {
    pub fn new(engine: Arc<dyn Engine>, compose: ComposeRunner) -> Self {
        Self {
            engine,
            compose: Arc::new(compose),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/containers", get(containers::list))
        .route("/containers/:id/inspect", get(containers::inspect))
        .route("/containers/:id/health", get(containers::health))
        .route("/containers/:id/logs", get(containers::logs))
        .route("/containers/:id/stats", get(containers::stats))
        .route("/containers/:id/start", post(containers::start))
        .route("/containers/:id/stop", post(containers::stop))
        .route("/containers/:id/remove", delete(containers::remove))
        .route("/containers/:id/services", get(containers::services))
        .route(
            "/containers/:id/services/:service/start",
            post(containers::start_service),
        )
        .route(
            "/containers/:id/services/:service/stop",
            post(containers::stop_service),
        )
        .route("/images", get(images::list))
        .route("/images/pull", post(images::pull))
        .route("/images/:id", delete(images::remove))
        .route("/volumes", get(volumes::list))
        .route("/volumes/create", post(volumes::create))
        .route("/volumes/prune", delete(volumes::prune))
        .route("/volumes/:name", delete(volumes::remove))
        .route("/volumes/:name/inspect", get(volumes::inspect))
        .route("/networks", get(networks::list))
        .route("/networks/create", post(networks::create))
        .route("/networks/:id", delete(networks::remove))
        .route("/compose/up", post(compose::up))
        .route("/compose/down", post(compose::down))
        .route("/compose/services", post(compose::services))
        .fallback(middleware::not_found)
        .layer(from_fn(middleware::cors))
        .layer(from_fn(middleware::log_requests))
        .with_state(state)
}

/// Serves until ctrl-c.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server running on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
}

/// Unwraps a JSON body, turning extractor rejections into the common error shape.
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| Error::InvalidInput(e.body_text()))
}

fn query<T>(params: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    params
        .map(|Query(value)| value)
        .map_err(|e| Error::InvalidInput(e.body_text()))
}

/// Required string field: absent and blank are both rejected with `message`.
fn required(value: Option<String>, message: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidInput(message.to_string()))
}
