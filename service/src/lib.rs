use config::Config;
use log::info;
use relay::Relay;
use std::sync::Arc;

pub mod config;
pub mod logging;

/// Builds the relay the host process owns for its whole lifetime.
pub fn init_relay(config: &Config) -> Arc<Relay> {
    let relay_config = config.relay_config();
    info!(
        "Relay config: outbound_queue_capacity={}",
        relay_config.outbound_queue_capacity
    );
    Arc::new(Relay::new(relay_config))
}

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, relay: &Arc<Relay>) -> Self {
        Self {
            relay: Arc::clone(relay),
            config: app_config,
        }
    }

    pub fn relay_ref(&self) -> &Relay {
        self.relay.as_ref()
    }
}
