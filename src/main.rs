use co2_tracker::{load_store, resolve_data_path, resolve_port, router, AppData, AppState, TrackerConfig};
use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = TrackerConfig::from_env()?;
    let data_path = resolve_data_path();
    if let Some(parent) = data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let store = load_store(&data_path).await;
    info!(
        entries = store.len(),
        co2_per_refusal = config.co2.per_refusal,
        "loaded tracker data from {}",
        data_path.display()
    );
    let state = AppState::new(data_path, AppData::load(store, config));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], resolve_port()));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
    info!("shutting down");
}
