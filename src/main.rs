use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use langforge::error::{LangforgeError, Result};
use langforge::server::router;
use langforge::settings::Settings;
use langforge::workshop::Workshop;

#[tokio::main]
async fn main() {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();
    if let Err(e) = serve(settings).await {
        error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

async fn serve(settings: Settings) -> Result<()> {
    let mode = settings.persistence_mode();
    let workshop = Arc::new(Workshop::open(&mode)?);
    let listener = TcpListener::bind(&settings.bind_address)
        .await
        .map_err(|e| LangforgeError::Config(format!("cannot bind {}: {e}", settings.bind_address)))?;
    info!(address = %settings.bind_address, ?mode, "langforge listening");
    axum::serve(listener, router(workshop))
        .await
        .map_err(|e| LangforgeError::Transport(e.to_string()))?;
    Ok(())
}
