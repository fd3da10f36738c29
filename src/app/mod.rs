pub mod actions;
pub mod state;
pub mod ui;
pub mod usage;

use bollard::models::{ContainerSummary, ImageSummary, Network, Volume};
use log::{debug, error, warn};
use tokio::sync::mpsc::error::TrySendError;

use crate::inputs::key::Key;
use crate::io::IoEvent;
use actions::{Action, Actions};
use state::{Modal, Prompt, PromptKind, Section};

/// Ticks a status line stays on screen, about five seconds at the default tick rate.
const STATUS_TICKS: u16 = 25;

#[derive(Debug, PartialEq, Eq)]
pub enum AppReturn {
    Exit,
    Continue,
}

/// A container as listed, with its health fetched separately.
#[derive(Debug, Clone)]
pub struct ContainerRow {
    pub summary: ContainerSummary,
    pub health: String,
}

impl ContainerRow {
    pub fn id(&self) -> &str {
        self.summary.id.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.summary
            .names
            .as_ref()
            .and_then(|names| names.first())
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.summary.state.as_deref() == Some("running")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
    ticks: u16,
}

pub struct App {
    /// We could dispatch an IO event
    io_tx: tokio::sync::mpsc::Sender<IoEvent>,
    /// Contextual actions
    actions: Actions,
    section: Section,
    selected: usize,
    modal: Option<Modal>,
    modal_scroll: u16,
    modal_selected: usize,
    prompt: Option<Prompt>,
    containers: Vec<ContainerRow>,
    images: Vec<ImageSummary>,
    volumes: Vec<Volume>,
    networks: Vec<Network>,
    project_dir: String,
    compose_output: String,
    status: Option<Status>,
    is_loading: bool,
}

impl App {
    pub fn new(io_tx: tokio::sync::mpsc::Sender<IoEvent>) -> Self {
        let section = Section::default();
        Self {
            io_tx,
            actions: section.get_actions(),
            section,
            selected: 0,
            modal: None,
            modal_scroll: 0,
            modal_selected: 0,
            prompt: None,
            containers: Vec::new(),
            images: Vec::new(),
            volumes: Vec::new(),
            networks: Vec::new(),
            project_dir: String::new(),
            compose_output: String::new(),
            status: None,
            is_loading: false,
        }
    }

    /// Handle a user action
    pub async fn do_action(&mut self, key: Key) -> AppReturn {
        if self.prompt.is_some() {
            self.do_prompt_input(key).await;
            return AppReturn::Continue;
        }
        let action = match self.actions.find(key) {
            Some(action) => *action,
            None => return AppReturn::Continue,
        };
        if self.modal.is_some() {
            self.do_modal_action(action).await;
            AppReturn::Continue
        } else {
            self.do_section_action(action).await
        }
    }

    async fn do_section_action(&mut self, action: Action) -> AppReturn {
        match action {
            Action::Quit => return AppReturn::Exit,
            Action::NextSection => self.switch_section(self.section.next()).await,
            Action::PreviousSection => self.switch_section(self.section.previous()).await,
            Action::Next => self.next(),
            Action::Previous => self.previous(),
            Action::Refresh => self.refresh().await,
            Action::ToggleRunning => {
                if let Some(row) = self.selected_container() {
                    let id = row.id().to_string();
                    let event = if row.is_running() {
                        IoEvent::StopContainer(id)
                    } else {
                        IoEvent::StartContainer(id)
                    };
                    self.dispatch(event).await;
                }
            }
            Action::Inspect => match (self.section, self.selected_id()) {
                (Section::Containers, Some(id)) => {
                    self.dispatch(IoEvent::InspectContainer(id)).await
                }
                (Section::Volumes, Some(name)) => self.dispatch(IoEvent::InspectVolume(name)).await,
                _ => {}
            },
            Action::ShowLogs => self.dispatch_for_selected(IoEvent::ShowLogs).await,
            Action::ShowStats => self.dispatch_for_selected(IoEvent::ShowStats).await,
            Action::ShowServices => self.dispatch_for_selected(IoEvent::ShowServices).await,
            Action::Remove => {
                let event: fn(String) -> IoEvent = match self.section {
                    Section::Containers => IoEvent::RemoveContainer,
                    Section::Images => IoEvent::RemoveImage,
                    Section::Volumes => IoEvent::RemoveVolume,
                    Section::Networks => IoEvent::RemoveNetwork,
                    Section::Compose => return AppReturn::Continue,
                };
                self.dispatch_for_selected(event).await;
            }
            Action::Pull => self.open_prompt(PromptKind::PullImage, String::new()),
            Action::Create => match self.section {
                Section::Volumes => self.open_prompt(PromptKind::CreateVolume, String::new()),
                Section::Networks => self.open_prompt(PromptKind::CreateNetwork, String::new()),
                _ => {}
            },
            Action::Prune => self.dispatch(IoEvent::PruneVolumes).await,
            Action::EditProjectDir => {
                self.open_prompt(PromptKind::ProjectDir, self.project_dir.clone())
            }
            Action::ComposeUp => self.dispatch_compose(IoEvent::ComposeUp).await,
            Action::ComposeDown => self.dispatch_compose(IoEvent::ComposeDown).await,
            Action::Close | Action::ScrollUp | Action::ScrollDown => {}
        }
        AppReturn::Continue
    }

    async fn do_modal_action(&mut self, action: Action) {
        let services_len = match &self.modal {
            Some(Modal::Services { units, .. }) => Some(units.len()),
            _ => None,
        };
        match action {
            Action::Close => self.close_modal(),
            Action::ScrollUp => match services_len {
                Some(_) => self.modal_selected = self.modal_selected.saturating_sub(1),
                None => self.modal_scroll = self.modal_scroll.saturating_sub(1),
            },
            Action::ScrollDown => match services_len {
                Some(len) => {
                    if self.modal_selected + 1 < len {
                        self.modal_selected += 1;
                    }
                }
                None => {
                    let lines = self
                        .modal
                        .as_ref()
                        .map(|m| m.body().lines().count())
                        .unwrap_or(0);
                    let last = u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX);
                    self.modal_scroll = self.modal_scroll.saturating_add(1).min(last);
                }
            },
            Action::ToggleRunning => {
                if let Some(event) = self.selected_service_event() {
                    self.dispatch(event).await;
                }
            }
            _ => {}
        }
    }

    fn selected_service_event(&self) -> Option<IoEvent> {
        let (container, units) = match &self.modal {
            Some(Modal::Services { container, units }) => (container, units),
            _ => return None,
        };
        let unit = units.get(self.modal_selected)?;
        let container = container.clone();
        let service = unit.name.clone();
        Some(if unit.active == "active" {
            IoEvent::StopService { container, service }
        } else {
            IoEvent::StartService { container, service }
        })
    }

    async fn do_prompt_input(&mut self, key: Key) {
        match key {
            Key::Esc => self.prompt = None,
            Key::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.submit_prompt(prompt).await;
                }
            }
            Key::Backspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.pop();
                }
            }
            _ => {
                if let (Some(prompt), Some(c)) = (self.prompt.as_mut(), key.get_char()) {
                    prompt.input.push(c);
                }
            }
        }
    }

    async fn submit_prompt(&mut self, prompt: Prompt) {
        let input = prompt.input.trim().to_string();
        match prompt.kind {
            PromptKind::ProjectDir => {
                self.project_dir = input.clone();
                self.compose_output.clear();
                if !input.is_empty() {
                    self.dispatch(IoEvent::ComposeServices(input)).await;
                }
            }
            _ if input.is_empty() => {
                self.set_error(format!("{} is required.", prompt.kind.title()));
            }
            PromptKind::PullImage => {
                self.set_status(format!("Pulling {}...", input));
                self.dispatch(IoEvent::PullImage(input)).await;
            }
            PromptKind::CreateVolume => self.dispatch(IoEvent::CreateVolume(input)).await,
            PromptKind::CreateNetwork => {
                let mut parts = input.split_whitespace();
                let name = parts.next().unwrap_or_default().to_string();
                let driver = parts.next().map(str::to_string);
                self.dispatch(IoEvent::CreateNetwork { name, driver }).await;
            }
        }
    }

    /// We could update the app or dispatch event on tick
    pub async fn update_on_tick(&mut self) -> AppReturn {
        if let Some(status) = self.status.as_mut() {
            status.ticks = status.ticks.saturating_sub(1);
            if status.ticks == 0 {
                self.status = None;
            }
        }
        AppReturn::Continue
    }

    /// Send a network event to the IO thread.
    /// Never waits: the IO task needs the `App` lock this caller holds.
    pub async fn dispatch(&mut self, action: IoEvent) {
        debug!("Dispatch {:?}", action);
        match self.io_tx.try_send(action) {
            Ok(()) => {}
            Err(TrySendError::Full(action)) => {
                warn!("IO queue full, dropped {:?}", action);
                self.set_error("Still busy with earlier requests, try again shortly.");
            }
            Err(e) => error!("Error from dispatch {}", e),
        }
    }

    /// Reloads whatever the current section shows.
    pub async fn refresh(&mut self) {
        let event = match self.section {
            Section::Containers => IoEvent::LoadContainers,
            Section::Images => IoEvent::LoadImages,
            Section::Volumes => IoEvent::LoadVolumes,
            Section::Networks => IoEvent::LoadNetworks,
            Section::Compose if self.project_dir.is_empty() => return,
            Section::Compose => IoEvent::ComposeServices(self.project_dir.clone()),
        };
        self.dispatch(event).await;
    }

    async fn switch_section(&mut self, section: Section) {
        self.section = section;
        self.selected = 0;
        self.modal = None;
        self.prompt = None;
        self.actions = section.get_actions();
        self.refresh().await;
    }

    async fn dispatch_for_selected(&mut self, event: fn(String) -> IoEvent) {
        if let Some(id) = self.selected_id() {
            self.dispatch(event(id)).await;
        }
    }

    async fn dispatch_compose(&mut self, event: fn(String) -> IoEvent) {
        if self.project_dir.is_empty() {
            self.set_error("Please select a project directory.");
            return;
        }
        let dir = self.project_dir.clone();
        self.dispatch(event(dir)).await;
    }

    fn open_prompt(&mut self, kind: PromptKind, input: String) {
        self.prompt = Some(Prompt { kind, input });
    }

    pub fn open_modal(&mut self, modal: Modal) {
        let same_services = matches!(
            (&self.modal, &modal),
            (Some(Modal::Services { container: a, .. }), Modal::Services { container: b, units })
                if a == b && self.modal_selected < units.len()
        );
        if !same_services {
            self.modal_selected = 0;
        }
        self.modal_scroll = 0;
        self.actions = modal.get_actions();
        self.modal = Some(modal);
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.actions = self.section.get_actions();
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: false,
            ticks: STATUS_TICKS,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: true,
            ticks: STATUS_TICKS,
        });
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_containers(&mut self, containers: Vec<ContainerRow>) {
        self.containers = containers;
        self.clamp_selection();
    }

    pub fn set_images(&mut self, images: Vec<ImageSummary>) {
        self.images = images;
        self.clamp_selection();
    }

    pub fn set_volumes(&mut self, volumes: Vec<Volume>) {
        self.volumes = volumes;
        self.clamp_selection();
    }

    pub fn set_networks(&mut self, networks: Vec<Network>) {
        self.networks = networks;
        self.clamp_selection();
    }

    pub fn set_compose_output(&mut self, output: String) {
        self.compose_output = output;
    }

    fn section_len(&self) -> usize {
        match self.section {
            Section::Containers => self.containers.len(),
            Section::Images => self.images.len(),
            Section::Volumes => self.volumes.len(),
            Section::Networks => self.networks.len(),
            Section::Compose => 0,
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.section_len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn next(&mut self) {
        if self.selected + 1 < self.section_len() {
            self.selected += 1;
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn selected_container(&self) -> Option<&ContainerRow> {
        match self.section {
            Section::Containers => self.containers.get(self.selected),
            _ => None,
        }
    }

    /// Identifier the gateway expects for the highlighted row: container and
    /// image ids, volume names, network ids.
    fn selected_id(&self) -> Option<String> {
        match self.section {
            Section::Containers => self.selected_container().map(|c| c.id().to_string()),
            Section::Images => self.images.get(self.selected).map(|i| i.id.clone()),
            Section::Volumes => self.volumes.get(self.selected).map(|v| v.name.clone()),
            Section::Networks => self.networks.get(self.selected).and_then(|n| n.id.clone()),
            Section::Compose => None,
        }
        .filter(|id| !id.is_empty())
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }
    pub fn section(&self) -> Section {
        self.section
    }
    pub fn selected(&self) -> usize {
        self.selected
    }
    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }
    pub fn modal_scroll(&self) -> u16 {
        self.modal_scroll
    }
    pub fn modal_selected(&self) -> usize {
        self.modal_selected
    }
    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }
    pub fn containers(&self) -> &[ContainerRow] {
        &self.containers
    }
    pub fn images(&self) -> &[ImageSummary] {
        &self.images
    }
    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }
    pub fn networks(&self) -> &[Network] {
        &self.networks
    }
    pub fn project_dir(&self) -> &str {
        &self.project_dir
    }
    pub fn compose_output(&self) -> &str {
        &self.compose_output
    }
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::services::ServiceUnit;
    use tokio::sync::mpsc::{channel, Receiver};

    fn app() -> (App, Receiver<IoEvent>) {
        let (tx, rx) = channel(16);
        (App::new(tx), rx)
    }

    fn container(id: &str, state: &str) -> ContainerRow {
        ContainerRow {
            summary: ContainerSummary {
                id: Some(id.to_string()),
                names: Some(vec![format!("/{}", id)]),
                state: Some(state.to_string()),
                ..Default::default()
            },
            health: "No Health Check".to_string(),
        }
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.do_action(Key::Char(c)).await;
        }
    }

    #[tokio::test]
    async fn quit_exits() {
        let (mut app, _rx) = app();
        assert_eq!(app.do_action(Key::Char('q')).await, AppReturn::Exit);
    }

    #[tokio::test]
    async fn switching_section_loads_it() {
        let (mut app, mut rx) = app();
        app.do_action(Key::Tab).await;
        assert_eq!(app.section(), Section::Images);
        assert_eq!(rx.try_recv().unwrap(), IoEvent::LoadImages);

        app.do_action(Key::BackTab).await;
        app.do_action(Key::BackTab).await;
        assert_eq!(app.section(), Section::Compose);
        rx.try_recv().unwrap();
        // no project directory yet, nothing to load
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn switching_section_closes_modal() {
        let (mut app, _rx) = app();
        app.open_modal(Modal::Logs {
            container: "web".to_string(),
            text: String::new(),
        });
        app.switch_section(Section::Networks).await;
        assert!(app.modal().is_none());
        assert_eq!(app.section(), Section::Networks);
        assert!(app.actions().find(Key::Char('c')).is_some());
    }

    #[tokio::test]
    async fn toggle_follows_container_state() {
        let (mut app, mut rx) = app();
        app.set_containers(vec![container("web", "running"), container("db", "exited")]);

        app.do_action(Key::Char('s')).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            IoEvent::StopContainer("web".to_string())
        );

        app.do_action(Key::Down).await;
        app.do_action(Key::Char('s')).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            IoEvent::StartContainer("db".to_string())
        );
    }

    #[tokio::test]
    async fn selection_stays_in_bounds() {
        let (mut app, _rx) = app();
        app.set_containers(vec![container("a", "running"), container("b", "running")]);
        app.next();
        app.next();
        assert_eq!(app.selected(), 1);
        app.set_containers(vec![container("a", "running")]);
        assert_eq!(app.selected(), 0);
        app.previous();
        assert_eq!(app.selected(), 0);
    }

    #[tokio::test]
    async fn compose_needs_a_project_directory() {
        let (mut app, mut rx) = app();
        app.switch_section(Section::Compose).await;
        app.do_action(Key::Char('u')).await;
        assert!(rx.try_recv().is_err());
        let status = app.status().unwrap();
        assert!(status.is_error);
        assert_eq!(status.text, "Please select a project directory.");

        app.do_action(Key::Char('d')).await;
        type_text(&mut app, "/srv/app").await;
        app.do_action(Key::Enter).await;
        assert_eq!(app.project_dir(), "/srv/app");
        assert_eq!(
            rx.try_recv().unwrap(),
            IoEvent::ComposeServices("/srv/app".to_string())
        );

        app.do_action(Key::Char('D')).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            IoEvent::ComposeDown("/srv/app".to_string())
        );
    }

    #[tokio::test]
    async fn prompt_captures_text_before_shortcuts() {
        let (mut app, mut rx) = app();
        app.switch_section(Section::Images).await;
        rx.try_recv().unwrap();

        app.do_action(Key::Char('p')).await;
        type_text(&mut app, "nginxq").await;
        app.do_action(Key::Backspace).await;
        app.do_action(Key::Enter).await;
        assert!(app.prompt().is_none());
        assert_eq!(
            rx.try_recv().unwrap(),
            IoEvent::PullImage("nginx".to_string())
        );
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let (mut app, mut rx) = app();
        app.switch_section(Section::Volumes).await;
        rx.try_recv().unwrap();

        app.do_action(Key::Char('c')).await;
        app.do_action(Key::Enter).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(app.status().unwrap().text, "Volume name is required.");
    }

    #[tokio::test]
    async fn network_prompt_takes_optional_driver() {
        let (mut app, mut rx) = app();
        app.switch_section(Section::Networks).await;
        rx.try_recv().unwrap();

        app.do_action(Key::Char('c')).await;
        type_text(&mut app, "backend overlay").await;
        app.do_action(Key::Enter).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            IoEvent::CreateNetwork {
                name: "backend".to_string(),
                driver: Some("overlay".to_string())
            }
        );
    }

    #[tokio::test]
    async fn modal_swallows_quit() {
        let (mut app, _rx) = app();
        app.open_modal(Modal::Logs {
            container: "web".to_string(),
            text: "a\nb\nc".to_string(),
        });
        app.do_action(Key::Down).await;
        app.do_action(Key::Down).await;
        app.do_action(Key::Down).await;
        assert_eq!(app.modal_scroll(), 2);

        assert_eq!(app.do_action(Key::Char('q')).await, AppReturn::Continue);
        assert!(app.modal().is_none());
        assert_eq!(app.do_action(Key::Char('q')).await, AppReturn::Exit);
    }

    #[tokio::test]
    async fn services_modal_toggles_selected_unit() {
        let (mut app, mut rx) = app();
        let unit = |name: &str, active: &str| ServiceUnit {
            name: name.to_string(),
            load: "loaded".to_string(),
            active: active.to_string(),
            sub: String::new(),
            description: String::new(),
        };
        app.open_modal(Modal::Services {
            container: "web".to_string(),
            units: vec![unit("cron.service", "active"), unit("nginx.service", "inactive")],
        });
        app.do_action(Key::Down).await;
        app.do_action(Key::Char('s')).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            IoEvent::StartService {
                container: "web".to_string(),
                service: "nginx.service".to_string()
            }
        );
    }

    #[tokio::test]
    async fn full_queue_reports_busy() {
        let (tx, mut rx) = channel(1);
        let mut app = App::new(tx);
        app.do_action(Key::Char('r')).await;
        app.do_action(Key::Char('r')).await;
        let status = app.status().unwrap();
        assert!(status.is_error);
        assert!(status.text.starts_with("Still busy"));

        assert_eq!(rx.try_recv().unwrap(), IoEvent::LoadContainers);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn status_expires() {
        let (mut app, _rx) = app();
        app.set_status("Container started");
        for _ in 0..STATUS_TICKS - 1 {
            app.update_on_tick().await;
        }
        assert!(app.status().is_some());
        app.update_on_tick().await;
        assert!(app.status().is_none());
    }
}
