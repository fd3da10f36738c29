use bollard::models::{ContainerInspectResponse, Volume};

use super::actions::{Action, Actions};
use super::usage::{format_bytes, format_percent, ContainerStats};
use crate::engine::services::ServiceUnit;

/// Top level views. Exactly one is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Containers,
    Images,
    Volumes,
    Networks,
    Compose,
}

impl Default for Section {
    fn default() -> Self {
        Self::Containers
    }
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Containers,
        Section::Images,
        Section::Volumes,
        Section::Networks,
        Section::Compose,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Containers => "Containers",
            Section::Images => "Images",
            Section::Volumes => "Volumes",
            Section::Networks => "Networks",
            Section::Compose => "Compose",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Section {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Section {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn get_actions(&self) -> Actions {
        let mut actions = vec![
            Action::Quit,
            Action::NextSection,
            Action::PreviousSection,
            Action::Refresh,
        ];
        match self {
            Section::Containers => actions.extend([
                Action::Next,
                Action::Previous,
                Action::ToggleRunning,
                Action::Inspect,
                Action::ShowLogs,
                Action::ShowStats,
                Action::ShowServices,
                Action::Remove,
            ]),
            Section::Images => {
                actions.extend([Action::Next, Action::Previous, Action::Pull, Action::Remove])
            }
            Section::Volumes => actions.extend([
                Action::Next,
                Action::Previous,
                Action::Create,
                Action::Inspect,
                Action::Remove,
                Action::Prune,
            ]),
            Section::Networks => actions.extend([
                Action::Next,
                Action::Previous,
                Action::Create,
                Action::Remove,
            ]),
            Section::Compose => actions.extend([
                Action::EditProjectDir,
                Action::ComposeUp,
                Action::ComposeDown,
            ]),
        }
        actions.into()
    }
}

/// Detail window drawn over the current section.
#[derive(Debug, Clone)]
pub enum Modal {
    Logs { container: String, text: String },
    Inspect(Box<ContainerInspectResponse>),
    Stats { container: String, stats: ContainerStats },
    Services { container: String, units: Vec<ServiceUnit> },
    Volume(Box<Volume>),
}

impl Modal {
    /// In the services window the arrows move the selection and `s` starts or stops
    /// the selected unit.
    pub fn get_actions(&self) -> Actions {
        let mut actions = vec![Action::Close, Action::ScrollUp, Action::ScrollDown];
        if let Modal::Services { .. } = self {
            actions.push(Action::ToggleRunning);
        }
        actions.into()
    }

    pub fn title(&self) -> String {
        match self {
            Modal::Logs { container, .. } => format!("Logs for {}", container),
            Modal::Inspect(_) => "Container".to_string(),
            Modal::Stats { container, .. } => format!("Container Stats for {}", container),
            Modal::Services { container, .. } => format!("Services in {}", container),
            Modal::Volume(_) => "Volume".to_string(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Modal::Logs { text, .. } => text.clone(),
            Modal::Inspect(info) => inspect_text(info),
            Modal::Stats { stats, .. } => stats_text(stats),
            Modal::Services { units, .. } => {
                if units.is_empty() {
                    return "No services found.".to_string();
                }
                units
                    .iter()
                    .map(|u| format!("{:<40} {:<8} {:<8} {}", u.name, u.active, u.sub, u.description))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Modal::Volume(volume) => {
                let mut lines = vec![
                    format!("Name: {}", volume.name),
                    format!("Driver: {}", volume.driver),
                    format!("Mountpoint: {}", volume.mountpoint),
                ];
                if let Some(created) = &volume.created_at {
                    lines.push(format!("Created: {}", local_time(created)));
                }
                if let Some(scope) = &volume.scope {
                    lines.push(format!("Scope: {}", scope));
                }
                lines.join("\n")
            }
        }
    }
}

fn inspect_text(info: &ContainerInspectResponse) -> String {
    let image = info
        .config
        .as_ref()
        .and_then(|c| c.image.clone())
        .unwrap_or_default();
    let state = info
        .state
        .as_ref()
        .and_then(|s| s.status.as_ref())
        .map(|s| s.to_string())
        .unwrap_or_default();
    [
        format!("Name: {}", info.name.clone().unwrap_or_default()),
        format!("ID: {}", info.id.clone().unwrap_or_default()),
        format!("Image: {}", image),
        format!("State: {}", state),
        format!(
            "Created: {}",
            info.created.as_deref().map(local_time).unwrap_or_default()
        ),
    ]
    .join("\n")
}

pub fn stats_text(stats: &ContainerStats) -> String {
    let (rx, tx) = stats.network_io();
    [
        format!("CPU Usage: {}%", format_percent(stats.cpu_percent())),
        format!(
            "Memory Usage: {}% ({} / {})",
            format_percent(stats.memory_percent()),
            format_bytes(stats.memory_stats.usage.unwrap_or(0)),
            format_bytes(stats.memory_stats.limit.unwrap_or(0))
        ),
        format!(
            "Network I/O: {} Received / {} Transmitted",
            format_bytes(rx),
            format_bytes(tx)
        ),
    ]
    .join("\n")
}

/// Engine timestamps are RFC 3339; shown in local time, or verbatim when unparsable.
pub fn local_time(value: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| value.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    ProjectDir,
    PullImage,
    CreateVolume,
    CreateNetwork,
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::ProjectDir => "Project directory",
            PromptKind::PullImage => "Image to pull",
            PromptKind::CreateVolume => "Volume name",
            PromptKind::CreateNetwork => "Network name [driver]",
        }
    }
}

/// Single line text input shown in place of the help bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_cycle_both_ways() {
        assert_eq!(Section::Containers.next(), Section::Images);
        assert_eq!(Section::Compose.next(), Section::Containers);
        assert_eq!(Section::Containers.previous(), Section::Compose);
    }

    #[test]
    fn every_context_has_unique_keys() {
        for section in Section::ALL {
            section.get_actions();
        }
        Modal::Services {
            container: "web".to_string(),
            units: Vec::new(),
        }
        .get_actions();
    }

    #[test]
    fn stats_modal_text() {
        let stats: ContainerStats = serde_json::from_value(serde_json::json!({
            "cpu_stats": { "cpu_usage": { "total_usage": 200, "percpu_usage": [0, 0, 0, 0] }, "system_cpu_usage": 600 },
            "precpu_stats": { "cpu_usage": { "total_usage": 100 }, "system_cpu_usage": 100 },
            "memory_stats": { "usage": 300, "limit": 1000, "stats": { "cache": 50 } },
            "networks": { "eth0": { "rx_bytes": 2048, "tx_bytes": 0 } }
        }))
        .unwrap();
        let text = stats_text(&stats);
        assert!(text.contains("CPU Usage: 80.00%"));
        assert!(text.contains("Memory Usage: 25.00% (300 Bytes / 1000 Bytes)"));
        assert!(text.contains("Network I/O: 2 KB Received / 0 Byte Transmitted"));
    }

    #[test]
    fn unparsable_time_is_shown_verbatim() {
        assert_eq!(local_time("yesterday"), "yesterday");
    }
}
