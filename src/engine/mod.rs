mod docker;
pub mod services;

pub use docker::DockerEngine;

use async_trait::async_trait;
use bollard::models::{
    ContainerInspectResponse, ContainerSummary, ImageSummary, Network, Volume,
    VolumePruneResponse,
};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Number of log lines returned when the caller does not ask for a specific tail.
pub const DEFAULT_LOG_TAIL: usize = 100;

/// Outcome of a state changing call on a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    /// The container already was in the requested state.
    Unchanged,
}

/// One progress event of an image pull.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullProgress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<bollard::models::CreateImageInfo> for PullProgress {
    fn from(info: bollard::models::CreateImageInfo) -> Self {
        Self {
            id: info.id,
            status: info.status,
            progress: info.progress,
            error: info.error,
        }
    }
}

/// Captured result of a command executed inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: Option<i64>,
    pub output: String,
}

impl ExecOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code.unwrap_or(0) == 0
    }
}

/// Progress events of a pull. Dropping the stream abandons the pull request.
pub type PullStream = BoxStream<'static, Result<PullProgress>>;

/// The engine operations the gateway forwards to.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Running and stopped containers.
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>>;
    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse>;
    /// The last `tail` lines of combined stdout and stderr.
    async fn container_logs(&self, id: &str, tail: usize) -> Result<String>;
    /// A single stats sample, as the engine serialized it.
    async fn container_stats(&self, id: &str) -> Result<serde_json::Value>;
    async fn start_container(&self, id: &str) -> Result<Transition>;
    async fn stop_container(&self, id: &str) -> Result<Transition>;
    /// Forced removal, running or not.
    async fn remove_container(&self, id: &str) -> Result<()>;
    async fn exec(&self, id: &str, cmd: Vec<String>) -> Result<ExecOutput>;

    async fn list_images(&self) -> Result<Vec<ImageSummary>>;
    fn pull_image(&self, image: &str) -> PullStream;
    async fn remove_image(&self, id: &str) -> Result<()>;

    async fn list_volumes(&self) -> Result<Vec<Volume>>;
    async fn create_volume(&self, name: &str) -> Result<Volume>;
    async fn inspect_volume(&self, name: &str) -> Result<Volume>;
    async fn remove_volume(&self, name: &str) -> Result<()>;
    async fn prune_volumes(&self) -> Result<VolumePruneResponse>;

    async fn list_networks(&self) -> Result<Vec<Network>>;
    async fn create_network(&self, name: &str, driver: Option<&str>) -> Result<()>;
    async fn remove_network(&self, id: &str) -> Result<()>;
}
