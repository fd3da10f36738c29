//! HTTP client for the gateway, used by the terminal dashboard.

use bollard::models::{
    ContainerInspectResponse, ContainerSummary, ImageSummary, Network, Volume,
};
use eyre::{eyre, Result, WrapErr};
use log::debug;
use reqwest::{Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::app::usage::ContainerStats;
use crate::engine::services::{ServiceAction, ServiceUnit};

/// Answer to a start or stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Done(String),
    /// The gateway answered 304: nothing to do.
    AlreadyInState,
}

#[derive(Deserialize)]
struct Message {
    message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct Containers {
    containers: Vec<ContainerSummary>,
}

#[derive(Deserialize)]
struct Images {
    images: Vec<ImageSummary>,
}

#[derive(Deserialize)]
struct Volumes {
    volumes: Vec<Volume>,
}

#[derive(Deserialize)]
struct Networks {
    networks: Vec<Network>,
}

#[derive(Deserialize)]
struct Health {
    health: String,
}

#[derive(Deserialize)]
struct Services {
    services: Vec<ServiceUnit>,
}

#[derive(Deserialize)]
struct ComposeServices {
    services: String,
}

#[derive(Clone, Debug)]
pub struct GatewayClient {
    http: reqwest::Client,
    base: Url,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).wrap_err_with(|| format!("invalid gateway url {}", base_url))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    /// Path segments are percent-encoded, so ids such as `library/nginx` stay one segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| eyre!("gateway url {} cannot be a base", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = self.url(segments)?;
        debug!("{} {}", method, url);
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request.send().await?;
        if resp.status().is_success() || resp.status() == StatusCode::NOT_MODIFIED {
            return Ok(resp);
        }
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        Err(eyre!("{} ({})", message.trim(), status))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        Ok(self.send(Method::GET, segments, None).await?.json().await?)
    }

    async fn message(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> Result<String> {
        let msg: Message = self.send(method, segments, body).await?.json().await?;
        Ok(msg.message)
    }

    async fn ack(&self, segments: &[&str]) -> Result<Ack> {
        let resp = self.send(Method::POST, segments, None).await?;
        if resp.status() == StatusCode::NOT_MODIFIED {
            return Ok(Ack::AlreadyInState);
        }
        let msg: Message = resp.json().await?;
        Ok(Ack::Done(msg.message))
    }

    pub async fn containers(&self) -> Result<Vec<ContainerSummary>> {
        Ok(self.get::<Containers>(&["containers"]).await?.containers)
    }

    pub async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse> {
        self.get(&["containers", id, "inspect"]).await
    }

    pub async fn health(&self, id: &str) -> Result<String> {
        Ok(self.get::<Health>(&["containers", id, "health"]).await?.health)
    }

    pub async fn logs(&self, id: &str) -> Result<String> {
        Ok(self
            .send(Method::GET, &["containers", id, "logs"], None)
            .await?
            .text()
            .await?)
    }

    pub async fn stats(&self, id: &str) -> Result<ContainerStats> {
        self.get(&["containers", id, "stats"]).await
    }

    pub async fn start_container(&self, id: &str) -> Result<Ack> {
        self.ack(&["containers", id, "start"]).await
    }

    pub async fn stop_container(&self, id: &str) -> Result<Ack> {
        self.ack(&["containers", id, "stop"]).await
    }

    pub async fn remove_container(&self, id: &str) -> Result<String> {
        self.message(Method::DELETE, &["containers", id, "remove"], None)
            .await
    }

    pub async fn services(&self, id: &str) -> Result<Vec<ServiceUnit>> {
        Ok(self
            .get::<Services>(&["containers", id, "services"])
            .await?
            .services)
    }

    pub async fn service_action(
        &self,
        id: &str,
        service: &str,
        action: ServiceAction,
    ) -> Result<String> {
        self.message(
            Method::POST,
            &["containers", id, "services", service, action.verb()],
            None,
        )
        .await
    }

    pub async fn images(&self) -> Result<Vec<ImageSummary>> {
        Ok(self.get::<Images>(&["images"]).await?.images)
    }

    pub async fn pull_image(&self, name: &str) -> Result<String> {
        self.message(
            Method::POST,
            &["images", "pull"],
            Some(json!({ "imageName": name })),
        )
        .await
    }

    pub async fn remove_image(&self, id: &str) -> Result<String> {
        self.message(Method::DELETE, &["images", id], None).await
    }

    pub async fn volumes(&self) -> Result<Vec<Volume>> {
        Ok(self.get::<Volumes>(&["volumes"]).await?.volumes)
    }

    pub async fn create_volume(&self, name: &str) -> Result<String> {
        self.message(
            Method::POST,
            &["volumes", "create"],
            Some(json!({ "volumeName": name })),
        )
        .await
    }

    pub async fn inspect_volume(&self, name: &str) -> Result<Volume> {
        self.get(&["volumes", name, "inspect"]).await
    }

    pub async fn remove_volume(&self, name: &str) -> Result<String> {
        self.message(Method::DELETE, &["volumes", name], None).await
    }

    pub async fn prune_volumes(&self) -> Result<String> {
        self.message(Method::DELETE, &["volumes", "prune"], None)
            .await
    }

    pub async fn networks(&self) -> Result<Vec<Network>> {
        Ok(self.get::<Networks>(&["networks"]).await?.networks)
    }

    pub async fn create_network(&self, name: &str, driver: Option<&str>) -> Result<String> {
        self.message(
            Method::POST,
            &["networks", "create"],
            Some(json!({ "name": name, "driver": driver })),
        )
        .await
    }

    pub async fn remove_network(&self, id: &str) -> Result<String> {
        self.message(Method::DELETE, &["networks", id], None).await
    }

    pub async fn compose_up(&self, project_dir: &str) -> Result<String> {
        self.message(
            Method::POST,
            &["compose", "up"],
            Some(json!({ "projectDir": project_dir })),
        )
        .await
    }

    pub async fn compose_down(&self, project_dir: &str) -> Result<String> {
        self.message(
            Method::POST,
            &["compose", "down"],
            Some(json!({ "projectDir": project_dir })),
        )
        .await
    }

    pub async fn compose_services(&self, project_dir: &str) -> Result<String> {
        let resp: ComposeServices = self
            .send(
                Method::POST,
                &["compose", "services"],
                Some(json!({ "projectDir": project_dir })),
            )
            .await?
            .json()
            .await?;
        Ok(resp.services)
    }
}
