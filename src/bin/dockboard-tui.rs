use std::sync::Arc;

use dockboard::app::App;
use dockboard::client::GatewayClient;
use dockboard::config::ClientConfig;
use dockboard::io::handler::IoAsyncHandler;
use dockboard::io::IoEvent;
use dockboard::start_ui;
use eyre::{Result, WrapErr};
use log::info;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ClientConfig::from_env()?;

    // The terminal belongs to the UI, so logs go to a file.
    if let Some(dir) = config.log_file.parent() {
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("failed to create {}", dir.display()))?;
    }
    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d} {l} - {m}\n")))
        .build(&config.log_file)?;
    let log_config = Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(Root::builder().appender("logfile").build(config.log_level))?;
    log4rs::init_config(log_config)?;
    info!("Using gateway at {}", config.gateway_url);

    let client = GatewayClient::new(&config.gateway_url)?;

    let (sync_io_tx, mut sync_io_rx) = tokio::sync::mpsc::channel::<IoEvent>(100);
    let app = Arc::new(tokio::sync::Mutex::new(App::new(sync_io_tx.clone())));
    let app_ui = Arc::clone(&app);

    tokio::spawn(async move {
        let mut handler = IoAsyncHandler::new(app, client);
        while let Some(io_event) = sync_io_rx.recv().await {
            handler.handle_io_event(io_event).await;
        }
    });

    start_ui(&app_ui).await?;
    Ok(())
}
