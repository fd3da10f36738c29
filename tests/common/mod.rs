//! In-memory engine and router helpers shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bollard::models::{
    ContainerInspectResponse, ContainerState, ContainerSummary, ImageSummary, Network, Volume,
    VolumePruneResponse,
};
use dockboard::compose::ComposeRunner;
use dockboard::engine::{Engine, ExecOutput, PullProgress, PullStream, Transition};
use dockboard::error::{Error, Result};
use dockboard::gateway::{router, AppState};
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

pub const UNITS: &str = "\
cron.service   loaded active   running Regular background program processing daemon
nginx.service  loaded inactive dead    A high performance web server
";

/// In-memory engine: `known` containers exist, those in `running` are up.
/// Images and volumes are kept so that reloads after a mutation can be observed.
#[derive(Default)]
pub struct FakeEngine {
    known: Vec<String>,
    running: Mutex<HashSet<String>>,
    images: Mutex<Vec<String>>,
    volumes: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn with(containers: &[(&str, bool)]) -> Self {
        Self {
            known: containers.iter().map(|(id, _)| id.to_string()).collect(),
            running: Mutex::new(
                containers
                    .iter()
                    .filter(|(_, up)| *up)
                    .map(|(id, _)| id.to_string())
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn with_images(self, ids: &[&str]) -> Self {
        *self.images.lock().unwrap() = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    fn check(&self, id: &str) -> Result<()> {
        if self.known.iter().any(|k| k == id) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("No such container: {}", id)))
        }
    }

    fn is_running(&self, id: &str) -> bool {
        self.running.lock().unwrap().contains(id)
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        Ok(self
            .known
            .iter()
            .map(|id| ContainerSummary {
                id: Some(id.clone()),
                names: Some(vec![format!("/{}", id)]),
                state: Some(if self.is_running(id) { "running" } else { "exited" }.to_string()),
                ..Default::default()
            })
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse> {
        self.check(id)?;
        Ok(ContainerInspectResponse {
            id: Some(id.to_string()),
            name: Some(format!("/{}", id)),
            state: Some(ContainerState {
                running: Some(self.is_running(id)),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    async fn container_logs(&self, id: &str, tail: usize) -> Result<String> {
        self.check(id)?;
        Ok(format!("last {} lines of {}\n", tail, id))
    }

    async fn container_stats(&self, id: &str) -> Result<Value> {
        self.check(id)?;
        Ok(json!({
            "cpu_stats": { "cpu_usage": { "total_usage": 200 }, "system_cpu_usage": 1500, "online_cpus": 4 },
            "precpu_stats": { "cpu_usage": { "total_usage": 100 }, "system_cpu_usage": 1000 },
            "memory_stats": { "usage": 300, "limit": 1000, "stats": { "cache": 50 } },
            "networks": { "eth0": { "rx_bytes": 1024, "tx_bytes": 2048 } }
        }))
    }

    async fn start_container(&self, id: &str) -> Result<Transition> {
        self.check(id)?;
        Ok(if self.running.lock().unwrap().insert(id.to_string()) {
            Transition::Changed
        } else {
            Transition::Unchanged
        })
    }

    async fn stop_container(&self, id: &str) -> Result<Transition> {
        self.check(id)?;
        Ok(if self.running.lock().unwrap().remove(id) {
            Transition::Changed
        } else {
            Transition::Unchanged
        })
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        self.check(id)
    }

    async fn exec(&self, id: &str, cmd: Vec<String>) -> Result<ExecOutput> {
        self.check(id)?;
        if cmd.iter().any(|c| c == "list-units") {
            return Ok(ExecOutput {
                exit_code: Some(0),
                output: UNITS.to_string(),
            });
        }
        Ok(ExecOutput {
            exit_code: Some(0),
            output: String::new(),
        })
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .map(|id| ImageSummary {
                id: id.clone(),
                repo_tags: vec![format!("{}:latest", id)],
                ..Default::default()
            })
            .collect())
    }

    fn pull_image(&self, image: &str) -> PullStream {
        let events = if image == "missing" {
            vec![Ok(PullProgress {
                error: Some("manifest for missing:latest not found".to_string()),
                ..Default::default()
            })]
        } else {
            vec![
                Ok(PullProgress {
                    status: Some("Pulling from library/nginx".to_string()),
                    ..Default::default()
                }),
                Ok(PullProgress {
                    id: Some("a2abf6c4d29d".to_string()),
                    status: Some("Download complete".to_string()),
                    ..Default::default()
                }),
            ]
        };
        stream::iter(events).boxed()
    }

    async fn remove_image(&self, id: &str) -> Result<()> {
        let mut images = self.images.lock().unwrap();
        match images.iter().position(|i| i == id) {
            Some(at) => {
                images.remove(at);
                Ok(())
            }
            None => Err(Error::NotFound(format!("No such image: {}", id))),
        }
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        Ok(self
            .volumes
            .lock()
            .unwrap()
            .iter()
            .map(|name| local_volume(name))
            .collect())
    }

    async fn create_volume(&self, name: &str) -> Result<Volume> {
        self.volumes.lock().unwrap().push(name.to_string());
        Ok(local_volume(name))
    }

    async fn inspect_volume(&self, name: &str) -> Result<Volume> {
        if self.volumes.lock().unwrap().iter().any(|v| v == name) {
            Ok(local_volume(name))
        } else {
            Err(Error::NotFound(format!("get {}: no such volume", name)))
        }
    }

    async fn remove_volume(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn prune_volumes(&self) -> Result<VolumePruneResponse> {
        Ok(VolumePruneResponse::default())
    }

    async fn list_networks(&self) -> Result<Vec<Network>> {
        Ok(Vec::new())
    }

    async fn create_network(&self, _name: &str, _driver: Option<&str>) -> Result<()> {
        Ok(())
    }

    async fn remove_network(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}

fn local_volume(name: &str) -> Volume {
    Volume {
        name: name.to_string(),
        driver: "local".to_string(),
        ..Default::default()
    }
}

pub async fn spawn(engine: FakeEngine, compose: ComposeRunner) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(Arc::new(engine), compose));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn gateway(engine: FakeEngine) -> String {
    spawn(engine, ComposeRunner::new("docker-compose", &[])).await
}

pub fn compose_project(root: &Path) -> String {
    let project = root.join("shop");
    std::fs::create_dir(&project).unwrap();
    std::fs::write(project.join("compose.yaml"), "services: {}\n").unwrap();
    project.to_string_lossy().into_owned()
}
