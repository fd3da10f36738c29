use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use eyre::{eyre, Result, WrapErr};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";
pub const DEFAULT_COMPOSE_BIN: &str = "docker-compose";

/// Gateway settings, read from the environment once at start-up.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
    pub compose_bin: String,
    pub compose_roots: Vec<PathBuf>,
    pub log_level: log::LevelFilter,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(v) => v
                .trim()
                .parse::<u16>()
                .wrap_err_with(|| format!("invalid PORT: {:?}", v))?,
            Err(_) => DEFAULT_PORT,
        };
        let compose_roots = match env::var("DOCKBOARD_COMPOSE_ROOTS") {
            Ok(v) => parse_roots(&v),
            Err(_) => default_roots(),
        };
        if compose_roots.is_empty() {
            return Err(eyre!(
                "no compose roots: set DOCKBOARD_COMPOSE_ROOTS to a colon separated list of directories"
            ));
        }
        Ok(Self {
            bind: env_string("DOCKBOARD_BIND", "0.0.0.0"),
            port,
            compose_bin: env_string("DOCKBOARD_COMPOSE_BIN", DEFAULT_COMPOSE_BIN),
            compose_roots,
            log_level: log_level_from_env(),
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .wrap_err_with(|| format!("invalid bind address {}:{}", self.bind, self.port))
    }
}

/// Dashboard client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub gateway_url: String,
    pub log_file: PathBuf,
    pub log_level: log::LevelFilter,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "dockboard")
            .ok_or_else(|| eyre!("could not resolve a data directory for the log file"))?;
        Ok(Self {
            gateway_url: env_string("DOCKBOARD_URL", DEFAULT_GATEWAY_URL)
                .trim_end_matches('/')
                .to_string(),
            log_file: dirs.data_local_dir().join("dockboard-tui.log"),
            log_level: log_level_from_env(),
        })
    }
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn log_level_from_env() -> log::LevelFilter {
    env::var("DOCKBOARD_LOG")
        .ok()
        .and_then(|v| v.trim().parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info)
}

fn default_roots() -> Vec<PathBuf> {
    directories::BaseDirs::new()
        .map(|dirs| vec![dirs.home_dir().to_path_buf()])
        .unwrap_or_default()
}

pub fn parse_roots(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Splits `docker compose` style values into the program and its leading arguments.
pub fn split_command(value: &str) -> (String, Vec<String>) {
    let mut parts = value.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .unwrap_or_else(|| DEFAULT_COMPOSE_BIN.to_string());
    (program, parts.collect())
}
