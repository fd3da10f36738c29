use async_trait::async_trait;
use bollard::container::{
    InspectContainerOptions, ListContainersOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StatsOptions, StopContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::{CreateImageOptions, ListImagesOptions, RemoveImageOptions};
use bollard::models::{
    ContainerInspectResponse, ContainerStateStatusEnum, ContainerSummary, ImageSummary, Network,
    Volume, VolumePruneResponse,
};
use bollard::network::{CreateNetworkOptions, ListNetworksOptions};
use bollard::volume::{CreateVolumeOptions, ListVolumesOptions, PruneVolumesOptions};
use bollard::Docker;
use futures::stream::StreamExt;
use log::{debug, info, warn};

use super::{Engine, ExecOutput, PullProgress, PullStream, Transition};
use crate::error::{is_not_modified, Error, Result};

const DEFAULT_NETWORK_DRIVER: &str = "bridge";

/// Engine backed by the local Docker daemon.
///
/// Holds one client for the lifetime of the process; `Docker` is cheap to clone
/// and shares its connection pool.
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connects using `DOCKER_HOST` or the platform's default socket.
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::UpstreamFailure(format!("Failed to connect to Docker: {}", e)))?;
        Ok(Self { docker })
    }

    /// Fails when the daemon is unreachable.
    pub async fn ping(&self) -> Result<()> {
        self.docker.ping().await?;
        Ok(())
    }
}

/// What `stop_container` does for a container in a given state.
#[derive(Debug, PartialEq, Eq)]
enum StopStep {
    AlreadyStopped,
    Stop,
    /// The state is transitional or unknown; the daemon decides.
    StopUnexpected,
}

fn stop_step(status: &ContainerStateStatusEnum) -> StopStep {
    match status {
        ContainerStateStatusEnum::EXITED
        | ContainerStateStatusEnum::CREATED
        | ContainerStateStatusEnum::DEAD => StopStep::AlreadyStopped,
        ContainerStateStatusEnum::RUNNING
        | ContainerStateStatusEnum::PAUSED
        | ContainerStateStatusEnum::RESTARTING => StopStep::Stop,
        ContainerStateStatusEnum::EMPTY | ContainerStateStatusEnum::REMOVING => {
            StopStep::StopUnexpected
        }
    }
}

#[async_trait]
impl Engine for DockerEngine {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                ..Default::default()
            }))
            .await?;
        debug!("Listed {} containers", containers.len());
        Ok(containers)
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse> {
        Ok(self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?)
    }

    async fn container_logs(&self, id: &str, tail: usize) -> Result<String> {
        let mut logs = Box::pin(self.docker.logs(
            id,
            Some(LogsOptions {
                follow: false,
                stdout: true,
                stderr: true,
                tail: tail.to_string(),
                ..Default::default()
            }),
        ));
        let mut text = String::new();
        while let Some(chunk) = logs.next().await {
            text.push_str(&chunk?.to_string());
        }
        Ok(text)
    }

    async fn container_stats(&self, id: &str) -> Result<serde_json::Value> {
        // stream=false makes the daemon wait for a second sample so precpu_stats is filled
        let mut stream = Box::pin(
            self.docker
                .stats(
                    id,
                    Some(StatsOptions {
                        stream: false,
                        ..Default::default()
                    }),
                )
                .take(1),
        );
        match stream.next().await {
            Some(Ok(stats)) => serde_json::to_value(stats)
                .map_err(|e| Error::UpstreamFailure(format!("Invalid stats payload: {}", e))),
            Some(Err(e)) => Err(e.into()),
            None => Err(Error::UpstreamFailure(format!(
                "No stats returned for container {}",
                id
            ))),
        }
    }

    async fn start_container(&self, id: &str) -> Result<Transition> {
        match self
            .docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
        {
            Ok(_) => {
                info!("Started container {}", id);
                Ok(Transition::Changed)
            }
            Err(e) if is_not_modified(&e) => Ok(Transition::Unchanged),
            Err(e) => Err(e.into()),
        }
    }

    async fn stop_container(&self, id: &str) -> Result<Transition> {
        let container = self.inspect_container(id).await?;
        let status = container
            .state
            .unwrap_or_default()
            .status
            .unwrap_or(ContainerStateStatusEnum::EMPTY);
        match stop_step(&status) {
            StopStep::AlreadyStopped => {
                debug!("Container {} already stopped ({})", id, status);
                return Ok(Transition::Unchanged);
            }
            StopStep::Stop => {}
            StopStep::StopUnexpected => warn!("Stopping container {} in status {}", id, status),
        }
        match self
            .docker
            .stop_container(id, Some(StopContainerOptions { t: 10 }))
            .await
        {
            Ok(_) => {
                info!("Stopped container {}", id);
                Ok(Transition::Changed)
            }
            Err(e) if is_not_modified(&e) => Ok(Transition::Unchanged),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;
        info!("Removed container {}", id);
        Ok(())
    }

    async fn exec(&self, id: &str, cmd: Vec<String>) -> Result<ExecOutput> {
        debug!("Exec in {}: {:?}", id, cmd);
        let exec = self
            .docker
            .create_exec(
                id,
                CreateExecOptions {
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    cmd: Some(cmd),
                    ..Default::default()
                },
            )
            .await?;
        let mut text = String::new();
        if let StartExecResults::Attached { mut output, .. } =
            self.docker.start_exec(&exec.id, None).await?
        {
            while let Some(chunk) = output.next().await {
                text.push_str(&chunk?.to_string());
            }
        }
        let inspect = self.docker.inspect_exec(&exec.id).await?;
        Ok(ExecOutput {
            exit_code: inspect.exit_code,
            output: text,
        })
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        Ok(self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await?)
    }

    fn pull_image(&self, image: &str) -> PullStream {
        info!("Pulling image {}", image);
        self.docker
            .create_image(
                Some(CreateImageOptions {
                    from_image: image.to_string(),
                    ..Default::default()
                }),
                None,
                None,
            )
            .map(|event| event.map(PullProgress::from).map_err(Error::from))
            .boxed()
    }

    async fn remove_image(&self, id: &str) -> Result<()> {
        let deleted = self
            .docker
            .remove_image(id, None::<RemoveImageOptions>, None)
            .await?;
        info!("Removed image {} ({} layers)", id, deleted.len());
        Ok(())
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        let response = self
            .docker
            .list_volumes(None::<ListVolumesOptions<String>>)
            .await?;
        Ok(response.volumes.unwrap_or_default())
    }

    async fn create_volume(&self, name: &str) -> Result<Volume> {
        let volume = self
            .docker
            .create_volume(CreateVolumeOptions {
                name: name.to_string(),
                ..Default::default()
            })
            .await?;
        info!("Created volume {}", volume.name);
        Ok(volume)
    }

    async fn inspect_volume(&self, name: &str) -> Result<Volume> {
        Ok(self.docker.inspect_volume(name).await?)
    }

    async fn remove_volume(&self, name: &str) -> Result<()> {
        self.docker.remove_volume(name, None).await?;
        info!("Removed volume {}", name);
        Ok(())
    }

    async fn prune_volumes(&self) -> Result<VolumePruneResponse> {
        let result = self
            .docker
            .prune_volumes(None::<PruneVolumesOptions<String>>)
            .await?;
        info!(
            "Pruned volumes, {} bytes reclaimed",
            result.space_reclaimed.unwrap_or(0)
        );
        Ok(result)
    }

    async fn list_networks(&self) -> Result<Vec<Network>> {
        Ok(self
            .docker
            .list_networks(None::<ListNetworksOptions<String>>)
            .await?)
    }

    async fn create_network(&self, name: &str, driver: Option<&str>) -> Result<()> {
        let driver = driver.unwrap_or(DEFAULT_NETWORK_DRIVER);
        self.docker
            .create_network(CreateNetworkOptions {
                name: name.to_string(),
                driver: driver.to_string(),
                check_duplicate: true,
                ..Default::default()
            })
            .await?;
        info!("Created network {} ({})", name, driver);
        Ok(())
    }

    async fn remove_network(&self, id: &str) -> Result<()> {
        self.docker.remove_network(id).await?;
        info!("Removed network {}", id);
        Ok(())
    }
}
