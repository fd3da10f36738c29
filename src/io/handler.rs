use std::sync::Arc;

use eyre::Result;
use futures::future::join_all;
use log::{debug, error, info};
use tokio::sync::Mutex;

use super::IoEvent;
use crate::app::state::Modal;
use crate::app::{App, ContainerRow};
use crate::client::{Ack, GatewayClient};
use crate::engine::services::ServiceAction;

/// Runs gateway calls for the UI, one event at a time.
pub struct IoAsyncHandler {
    app: Arc<Mutex<App>>,
    client: GatewayClient,
}

impl IoAsyncHandler {
    pub fn new(app: Arc<Mutex<App>>, client: GatewayClient) -> Self {
        Self { app, client }
    }

    /// We could be async here
    pub async fn handle_io_event(&mut self, io_event: IoEvent) {
        self.app.lock().await.set_loading(true);
        let result = self.run(io_event).await;

        let mut app = self.app.lock().await;
        app.set_loading(false);
        if let Err(err) = result {
            error!("Oops, something wrong happen: {:?}", err);
            app.set_error(err.to_string());
        }
    }

    async fn run(&mut self, io_event: IoEvent) -> Result<()> {
        match io_event {
            IoEvent::LoadContainers => self.load_containers().await,
            IoEvent::LoadImages => self.load_images().await,
            IoEvent::LoadVolumes => self.load_volumes().await,
            IoEvent::LoadNetworks => self.load_networks().await,
            IoEvent::StartContainer(id) => {
                let ack = self.client.start_container(&id).await?;
                self.acknowledge(ack, format!("Container {} is already running.", id))
                    .await;
                self.load_containers().await
            }
            IoEvent::StopContainer(id) => {
                let ack = self.client.stop_container(&id).await?;
                self.acknowledge(ack, format!("Container {} is already stopped.", id))
                    .await;
                self.load_containers().await
            }
            IoEvent::RemoveContainer(id) => {
                let msg = self.client.remove_container(&id).await?;
                self.app.lock().await.set_status(msg);
                self.load_containers().await
            }
            IoEvent::InspectContainer(id) => {
                let info = self.client.inspect_container(&id).await?;
                self.app.lock().await.open_modal(Modal::Inspect(Box::new(info)));
                Ok(())
            }
            IoEvent::ShowLogs(id) => {
                let text = self.client.logs(&id).await?;
                self.app.lock().await.open_modal(Modal::Logs {
                    container: id,
                    text,
                });
                Ok(())
            }
            IoEvent::ShowStats(id) => {
                let stats = self.client.stats(&id).await?;
                self.app.lock().await.open_modal(Modal::Stats {
                    container: id,
                    stats,
                });
                Ok(())
            }
            IoEvent::ShowServices(id) => self.show_services(id).await,
            IoEvent::StartService { container, service } => {
                self.service_action(container, service, ServiceAction::Start)
                    .await
            }
            IoEvent::StopService { container, service } => {
                self.service_action(container, service, ServiceAction::Stop)
                    .await
            }
            IoEvent::PullImage(name) => {
                info!("Pulling image {}", name);
                let msg = self.client.pull_image(&name).await?;
                self.app.lock().await.set_status(msg);
                self.load_images().await
            }
            IoEvent::RemoveImage(id) => {
                let msg = self.client.remove_image(&id).await?;
                self.app.lock().await.set_status(msg);
                self.load_images().await
            }
            IoEvent::CreateVolume(name) => {
                let msg = self.client.create_volume(&name).await?;
                self.app.lock().await.set_status(msg);
                self.load_volumes().await
            }
            IoEvent::InspectVolume(name) => {
                let volume = self.client.inspect_volume(&name).await?;
                self.app.lock().await.open_modal(Modal::Volume(Box::new(volume)));
                Ok(())
            }
            IoEvent::RemoveVolume(name) => {
                let msg = self.client.remove_volume(&name).await?;
                self.app.lock().await.set_status(msg);
                self.load_volumes().await
            }
            IoEvent::PruneVolumes => {
                let msg = self.client.prune_volumes().await?;
                self.app.lock().await.set_status(msg);
                self.load_volumes().await
            }
            IoEvent::CreateNetwork { name, driver } => {
                let msg = self.client.create_network(&name, driver.as_deref()).await?;
                self.app.lock().await.set_status(msg);
                self.load_networks().await
            }
            IoEvent::RemoveNetwork(id) => {
                let msg = self.client.remove_network(&id).await?;
                self.app.lock().await.set_status(msg);
                self.load_networks().await
            }
            IoEvent::ComposeUp(dir) => {
                let output = self.client.compose_up(&dir).await?;
                debug!("compose up: {}", output);
                self.app.lock().await.set_status("Compose project started.");
                self.load_compose_services(&dir).await
            }
            IoEvent::ComposeDown(dir) => {
                let output = self.client.compose_down(&dir).await?;
                debug!("compose down: {}", output);
                self.app.lock().await.set_status("Compose project stopped.");
                self.load_compose_services(&dir).await
            }
            IoEvent::ComposeServices(dir) => self.load_compose_services(&dir).await,
        }
    }

    /// Lists containers, then asks for every container's health concurrently.
    /// A failed health lookup shows as `Error` rather than failing the list.
    async fn load_containers(&mut self) -> Result<()> {
        let containers = self.client.containers().await?;
        let client = &self.client;
        let rows = join_all(containers.into_iter().map(|summary| async move {
            let health = match summary.id.as_deref() {
                Some(id) => client.health(id).await.unwrap_or_else(|err| {
                    error!("Health of {} unavailable: {}", id, err);
                    "Error".to_string()
                }),
                None => "Error".to_string(),
            };
            ContainerRow { summary, health }
        }))
        .await;
        self.app.lock().await.set_containers(rows);
        Ok(())
    }

    async fn load_images(&mut self) -> Result<()> {
        let images = self.client.images().await?;
        self.app.lock().await.set_images(images);
        Ok(())
    }

    async fn load_volumes(&mut self) -> Result<()> {
        let volumes = self.client.volumes().await?;
        self.app.lock().await.set_volumes(volumes);
        Ok(())
    }

    async fn load_networks(&mut self) -> Result<()> {
        let networks = self.client.networks().await?;
        self.app.lock().await.set_networks(networks);
        Ok(())
    }

    async fn load_compose_services(&mut self, dir: &str) -> Result<()> {
        let output = self.client.compose_services(dir).await?;
        self.app.lock().await.set_compose_output(output);
        Ok(())
    }

    async fn show_services(&mut self, id: String) -> Result<()> {
        let units = self.client.services(&id).await?;
        self.app.lock().await.open_modal(Modal::Services {
            container: id,
            units,
        });
        Ok(())
    }

    async fn service_action(
        &mut self,
        container: String,
        service: String,
        action: ServiceAction,
    ) -> Result<()> {
        info!("{} service {} in {}", action.verb(), service, container);
        let msg = self
            .client
            .service_action(&container, &service, action)
            .await?;
        self.app.lock().await.set_status(msg);
        self.show_services(container).await
    }

    async fn acknowledge(&self, ack: Ack, unchanged: String) {
        let mut app = self.app.lock().await;
        match ack {
            Ack::Done(msg) => app.set_status(msg),
            Ack::AlreadyInState => app.set_status(unchanged),
        }
    }
}
