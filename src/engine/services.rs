//! Service units running inside a container, driven through `systemctl` over exec.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUnit {
    pub name: String,
    pub load: String,
    pub active: String,
    pub sub: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
}

impl ServiceAction {
    pub fn verb(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            ServiceAction::Start => "started",
            ServiceAction::Stop => "stopped",
        }
    }
}

pub fn list_command() -> Vec<String> {
    [
        "systemctl",
        "list-units",
        "--type=service",
        "--all",
        "--no-legend",
        "--no-pager",
        "--plain",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn action_command(action: ServiceAction, service: &str) -> Result<Vec<String>> {
    validate_service_name(service)?;
    Ok(vec![
        "systemctl".to_string(),
        action.verb().to_string(),
        service.to_string(),
    ])
}

/// Unit names go straight into an argument vector, but a leading `-` would still be read as a flag.
pub fn validate_service_name(service: &str) -> Result<()> {
    let valid = !service.is_empty()
        && !service.starts_with('-')
        && service
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Invalid service name: {:?}",
            service
        )))
    }
}

/// Parses `systemctl list-units --plain --no-legend` output. Lines that aren't a
/// `.service` unit followed by its three state columns are skipped.
pub fn parse_units(output: &str) -> Vec<ServiceUnit> {
    output
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let name = cols.next().filter(|n| n.ends_with(".service"))?;
            let load = cols.next()?;
            let active = cols.next()?;
            let sub = cols.next()?;
            Some(ServiceUnit {
                name: name.to_string(),
                load: load.to_string(),
                active: active.to_string(),
                sub: sub.to_string(),
                description: cols.collect::<Vec<_>>().join(" "),
            })
        })
        .collect()
}
