use std::sync::Arc;

use dockboard::compose::ComposeRunner;
use dockboard::config::GatewayConfig;
use dockboard::engine::DockerEngine;
use dockboard::gateway::{self, AppState};
use eyre::{Result, WrapErr};
use log::{info, warn};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env()?;

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}",
        )))
        .build();
    let log_config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(config.log_level))?;
    log4rs::init_config(log_config)?;

    let engine = DockerEngine::connect()?;
    if let Err(e) = engine.ping().await {
        warn!("Docker daemon is not reachable yet: {}", e);
    }

    let compose = ComposeRunner::new(&config.compose_bin, &config.compose_roots);
    for root in compose.roots() {
        info!("Compose projects allowed under {}", root.display());
    }

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {}", addr))?;

    gateway::serve(listener, AppState::new(Arc::new(engine), compose)).await?;
    Ok(())
}
