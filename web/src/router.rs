use crate::controller::{health_check_controller, status_controller};
use crate::ws::handler::ws_handler;
use crate::AppState;
use axum::{routing::get, Router};

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(status_routes(app_state.clone()))
        .merge(ws_routes(app_state))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn status_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/status", get(status_controller::status))
        .with_state(app_state)
}

fn ws_routes(app_state: AppState) -> Router {
    let ws_path = app_state.config.ws_path.clone();
    Router::new()
        .route(&ws_path, get(ws_handler))
        .with_state(app_state)
}
