use log::{error, info};
use service::{config::Config, logging::Logger, AppState};

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
    }

    info!(
        "Starting messaging relay v{} [{}]",
        env!("CARGO_PKG_VERSION"),
        config.runtime_env()
    );

    let relay = service::init_relay(&config);
    let app_state = AppState::new(config, &relay);

    if let Err(e) = web::init_server(app_state).await {
        error!("Relay server stopped: {e}");
        std::process::exit(1);
    }

    info!(
        "Relay stopped with {} connection(s) still registered",
        relay.registry().connection_count()
    );
}
