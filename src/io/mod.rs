pub mod handler;

/// Work the UI hands to the IO task. Every variant is one or more gateway calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoEvent {
    LoadContainers,
    LoadImages,
    LoadVolumes,
    LoadNetworks,
    StartContainer(String),
    StopContainer(String),
    RemoveContainer(String),
    InspectContainer(String),
    ShowLogs(String),
    ShowStats(String),
    ShowServices(String),
    StartService { container: String, service: String },
    StopService { container: String, service: String },
    PullImage(String),
    RemoveImage(String),
    CreateVolume(String),
    InspectVolume(String),
    RemoveVolume(String),
    PruneVolumes,
    CreateNetwork { name: String, driver: Option<String> },
    RemoveNetwork(String),
    ComposeUp(String),
    ComposeDown(String),
    ComposeServices(String),
}
