//! Scrawl persistence server binary.

use scrawl_server::{AppState, bind_addr, router};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scrawl_server=info,tower_http=info".into()),
        )
        .init();

    let scrawl_addr = std::env::var("SCRAWL_ADDR").ok();
    let port = std::env::var("PORT").ok();
    let addr = bind_addr(scrawl_addr.as_deref(), port.as_deref());

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    info!("Scrawl server listening on http://{addr}");

    if let Err(e) = axum::serve(listener, router(AppState::shared())).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
