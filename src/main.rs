use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use camrec::{create_router, storage, AppState, CaptureSupervisor, ConfigStore, Settings};
use clap::Parser;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "camrec", about = "Dual-channel network camera recorder")]
struct Args {
    /// Service settings file (extension optional, defaults apply if absent)
    #[arg(long, default_value = "config/camrec")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let settings = Arc::new(Settings::load(&args.config)?);

    info!("camrec v{}", env!("CARGO_PKG_VERSION"));
    info!("waiting for storage mount {}", settings.storage.mount_path);
    storage::wait_for_mount(
        Path::new(&settings.storage.mount_path),
        Duration::from_secs(settings.storage.mount_timeout_secs),
    )
    .await?;

    let store = Arc::new(ConfigStore::load(&settings.recording_config));
    let supervisor = Arc::new(CaptureSupervisor::new(
        Arc::clone(&store),
        settings.capture.program.clone(),
        settings.capture.pid_dir.clone(),
    ));

    let state = AppState {
        settings: Arc::clone(&settings),
        store,
        supervisor,
    };
    let app = create_router(state);

    let addr = format!("{}:{}", settings.http.bind, settings.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
