use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use invoice_lab::config::{load_config, AppConfig};
use invoice_lab::observability::{logging, metrics};
use invoice_lab::{Collaborators, HttpServer, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    tracing::info!("invoice-lab v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::warn!("every endpoint here is intentionally vulnerable; never expose this server");

    // Optional config file path as the single argument.
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&PathBuf::from(path))?,
        None => AppConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        handler_ceiling_secs = config.timeouts.handler_secs,
        files_root = %config.files.root,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "failed to parse metrics address"
            ),
        }
    }

    let collab = Arc::new(Collaborators::new(&config).await?);
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown.trigger_on_ctrl_c().await;
    });

    let server = HttpServer::new(&config, collab)?;
    server.run(listener, receiver).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
