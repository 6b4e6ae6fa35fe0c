use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use tinytrack_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tinytrack=info".parse()?),
        )
        .json()
        .init();

    let cfg = tinytrack_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Ensure the data directory exists before opening DuckDB.
    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/tinytrack.db", cfg.data_dir);

    // Opening the store applies migrations; any schema failure halts startup.
    let store = tinytrack_duckdb::DuckDbStore::open(&db_path, &cfg.duckdb_memory_limit)?;

    let addr = format!("0.0.0.0:{}", cfg.port);
    let state = Arc::new(AppState::new(store, cfg.clone()));
    let app = tinytrack_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, "tinytrack listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
