//! promerge gateway
//!
//! - Ingest: POST exposition text or CloudWatch subscription records
//! - Scrape: GET /metrics returns the merged aggregate
//! - Config path: first argument, else `PROMERGE_CONFIG`, else `promerge.yaml`

use std::env;
use std::error::Error;

use tracing_subscriber::{fmt, EnvFilter};

use promerge_gateway::{app_state, config, router};

const DEFAULT_CONFIG: &str = "promerge.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = env::args()
        .nth(1)
        .or_else(|| env::var("PROMERGE_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let cfg = config::load_from_file(&path).map_err(|e| {
        tracing::error!(%path, error = %e, "config load failed");
        e
    })?;
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::new(cfg);
    let app = router::build_router(state);

    tracing::info!(%listen, %path, "promerge-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app).await?;
    Ok(())
}
