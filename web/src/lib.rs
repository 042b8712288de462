//! HTTP/WebSocket host for the messaging relay.

use axum::http::{HeaderValue, Method};
use log::*;
use service::config::Config;
use std::io;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

mod controller;
mod error;
mod extractors;
pub mod router;
pub mod ws;

pub use service::AppState;

/// Binds to the configured interface and serves until Ctrl-C.
pub async fn init_server(app_state: AppState) -> io::Result<()> {
    let bind_address = app_state.config.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    info!(
        "Relay listening on {} (WebSocket path {})",
        bind_address, app_state.config.ws_path
    );

    serve(listener, app_state).await
}

/// Serves on an already bound listener. Tests bind to port 0 and call this.
pub async fn serve(listener: TcpListener, app_state: AppState) -> io::Result<()> {
    let cors = cors_layer(&app_state.config);
    let app = router::define_routes(app_state).layer(cors);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

fn cors_layer(config: &Config) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allow_origin(&config.allowed_origins))
        .allow_methods([Method::GET])
}

/// A `*` entry allows every origin; otherwise only the listed ones.
fn allow_origin(allowed_origins: &[String]) -> AllowOrigin {
    if allowed_origins.iter().any(|origin| origin.trim() == "*") {
        return AllowOrigin::any();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    AllowOrigin::list(origins)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
