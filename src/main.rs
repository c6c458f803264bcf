use japa_counter::config::log_filter;
use japa_counter::{router, AppState, Config, ProgressStore};
use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::fmt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    fmt().with_env_filter(log_filter(rust_log.as_deref())).init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let store = ProgressStore::open(config.data_path.clone()).await;
    info!(
        data_path = %store.path().display(),
        remote = %config.remote_url,
        cooldown_ms = config.sync_cooldown.as_millis() as u64,
        "progress store ready"
    );
    let app = router(AppState::new(&config, store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
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
