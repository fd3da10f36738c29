mod common;

use std::sync::Arc;

use common::{compose_project, gateway, spawn, FakeEngine};
use dockboard::app::App;
use dockboard::client::GatewayClient;
use dockboard::compose::ComposeRunner;
use dockboard::io::handler::IoAsyncHandler;
use dockboard::io::IoEvent;
use tokio::sync::mpsc::{channel, Receiver};
use tokio::sync::Mutex;

struct Dashboard {
    app: Arc<Mutex<App>>,
    handler: IoAsyncHandler,
    _rx: Receiver<IoEvent>,
}

impl Dashboard {
    fn new(base: &str) -> Self {
        let (tx, rx) = channel(8);
        let app = Arc::new(Mutex::new(App::new(tx)));
        let handler = IoAsyncHandler::new(app.clone(), GatewayClient::new(base).unwrap());
        Self {
            app,
            handler,
            _rx: rx,
        }
    }

    async fn run(&mut self, event: IoEvent) {
        self.handler.handle_io_event(event).await;
    }

    async fn status(&self) -> (String, bool) {
        let app = self.app.lock().await;
        let status = app.status().expect("a status line");
        (status.text.clone(), status.is_error)
    }
}

#[tokio::test]
async fn stop_on_stopped_container_says_so_and_reloads() {
    let base = gateway(FakeEngine::with(&[("web", true), ("db", false)])).await;
    let mut dash = Dashboard::new(&base);

    dash.run(IoEvent::StopContainer("db".to_string())).await;
    assert_eq!(
        dash.status().await,
        ("Container db is already stopped.".to_string(), false)
    );
    assert_eq!(dash.app.lock().await.containers().len(), 2);

    dash.run(IoEvent::StopContainer("web".to_string())).await;
    assert_eq!(
        dash.status().await,
        ("Container web stopped successfully".to_string(), false)
    );
    let app = dash.app.lock().await;
    assert!(app.containers().iter().all(|c| !c.is_running()));
    assert!(!app.is_loading());
}

#[tokio::test]
async fn removing_an_image_reloads_images() {
    let base = gateway(FakeEngine::default().with_images(&["alpine", "nginx"])).await;
    let mut dash = Dashboard::new(&base);

    dash.run(IoEvent::LoadImages).await;
    assert_eq!(dash.app.lock().await.images().len(), 2);

    dash.run(IoEvent::RemoveImage("alpine".to_string())).await;
    let app = dash.app.lock().await;
    let ids: Vec<_> = app.images().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["nginx"]);
    assert!(!app.status().unwrap().is_error);
}

#[tokio::test]
async fn creating_a_volume_reloads_volumes() {
    let base = gateway(FakeEngine::default()).await;
    let mut dash = Dashboard::new(&base);

    dash.run(IoEvent::CreateVolume("cache".to_string())).await;
    assert_eq!(
        dash.status().await,
        ("Volume cache created successfully".to_string(), false)
    );
    let app = dash.app.lock().await;
    assert_eq!(app.volumes().len(), 1);
    assert_eq!(app.volumes()[0].name, "cache");
}

#[tokio::test]
async fn compose_up_and_down_show_the_service_listing() {
    let root = tempfile::tempdir().unwrap();
    let project = compose_project(root.path());
    let base = spawn(
        FakeEngine::default(),
        ComposeRunner::new("echo", &[root.path().to_path_buf()]),
    )
    .await;
    let mut dash = Dashboard::new(&base);

    dash.run(IoEvent::ComposeUp(project.clone())).await;
    assert_eq!(
        dash.status().await,
        ("Compose project started.".to_string(), false)
    );
    {
        let app = dash.app.lock().await;
        let output = app.compose_output().trim_end();
        assert!(output.ends_with("compose.yaml ps"), "{}", output);
    }

    dash.run(IoEvent::ComposeDown(project)).await;
    assert_eq!(
        dash.status().await,
        ("Compose project stopped.".to_string(), false)
    );
    let app = dash.app.lock().await;
    let output = app.compose_output().trim_end();
    assert!(output.ends_with("compose.yaml ps"), "{}", output);
}

#[tokio::test]
async fn gateway_errors_reach_the_status_line() {
    let base = gateway(FakeEngine::with(&[("web", true)])).await;
    let mut dash = Dashboard::new(&base);

    dash.run(IoEvent::StopContainer("ghost".to_string())).await;
    let (text, is_error) = dash.status().await;
    assert!(is_error);
    assert!(text.contains("No such container: ghost"), "{}", text);
    assert!(!dash.app.lock().await.is_loading());
}
