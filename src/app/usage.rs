use std::collections::HashMap;

use serde::Deserialize;

const SIZES: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// The parts of an engine stats sample the dashboard reads. Everything is optional;
/// cgroup v2 hosts for instance omit `percpu_usage` and the memory `cache` counter.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct ContainerStats {
    #[serde(default)]
    pub cpu_stats: CpuStats,
    #[serde(default)]
    pub precpu_stats: CpuStats,
    #[serde(default)]
    pub memory_stats: MemoryStats,
    #[serde(default)]
    pub networks: Option<HashMap<String, NetworkStats>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct CpuStats {
    #[serde(default)]
    pub cpu_usage: CpuUsage,
    #[serde(default)]
    pub system_cpu_usage: Option<u64>,
    #[serde(default)]
    pub online_cpus: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct CpuUsage {
    #[serde(default)]
    pub total_usage: u64,
    #[serde(default)]
    pub percpu_usage: Option<Vec<u64>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct MemoryStats {
    #[serde(default)]
    pub usage: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub stats: Option<MemoryDetail>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct MemoryDetail {
    #[serde(default)]
    pub cache: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct NetworkStats {
    #[serde(default)]
    pub rx_bytes: u64,
    #[serde(default)]
    pub tx_bytes: u64,
}

impl ContainerStats {
    /// `(cpuDelta / systemDelta) * cpus * 100`. `None` when the system counter
    /// did not move or the sample doesn't say how many CPUs there are.
    pub fn cpu_percent(&self) -> Option<f64> {
        let cpu_delta = self
            .cpu_stats
            .cpu_usage
            .total_usage
            .checked_sub(self.precpu_stats.cpu_usage.total_usage)
            .unwrap_or(0);
        let system_delta = self
            .cpu_stats
            .system_cpu_usage
            .unwrap_or(0)
            .checked_sub(self.precpu_stats.system_cpu_usage.unwrap_or(0))
            .unwrap_or(0);
        if system_delta == 0 {
            return None;
        }
        let cpus = self
            .cpu_stats
            .online_cpus
            .filter(|n| *n > 0)
            .or_else(|| {
                self.cpu_stats
                    .cpu_usage
                    .percpu_usage
                    .as_ref()
                    .map(|v| v.len() as u64)
                    .filter(|n| *n > 0)
            })?;
        Some(cpu_delta as f64 / system_delta as f64 * cpus as f64 * 100.0)
    }

    /// `(usage - cache) / limit * 100`, cache counting as 0 when absent.
    pub fn memory_percent(&self) -> Option<f64> {
        let usage = self.memory_stats.usage?;
        let limit = self.memory_stats.limit.filter(|l| *l > 0)?;
        let cache = self
            .memory_stats
            .stats
            .as_ref()
            .and_then(|s| s.cache)
            .unwrap_or(0);
        Some(usage.saturating_sub(cache) as f64 / limit as f64 * 100.0)
    }

    /// Received and transmitted bytes on `eth0`, or summed over every interface
    /// when there is no `eth0`.
    pub fn network_io(&self) -> (u64, u64) {
        let networks = match &self.networks {
            Some(n) => n,
            None => return (0, 0),
        };
        if let Some(eth0) = networks.get("eth0") {
            return (eth0.rx_bytes, eth0.tx_bytes);
        }
        networks.values().fold((0, 0), |(rx, tx), n| {
            (rx + n.rx_bytes, tx + n.tx_bytes)
        })
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "N/A".to_string(),
    }
}

/// Human readable size in powers of 1024, rounded to a whole number.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Byte".to_string();
    }
    let mut i = 0;
    let mut threshold: u64 = 1024;
    while i < SIZES.len() - 1 && bytes >= threshold {
        i += 1;
        threshold = threshold.saturating_mul(1024);
    }
    let value = (bytes as f64 / 1024f64.powi(i as i32)).round();
    format!("{} {}", value as u64, SIZES[i])
}
