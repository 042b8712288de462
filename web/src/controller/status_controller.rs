use crate::controller::ApiResponse;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct RelayStatus {
    connections: usize,
    identities: usize,
}

/// GET live connection counts from the relay registry
pub async fn status(State(app_state): State<AppState>) -> impl IntoResponse {
    let registry = app_state.relay_ref().registry();
    let status = RelayStatus {
        connections: registry.connection_count(),
        identities: registry.identity_count(),
    };

    Json(ApiResponse::new(StatusCode::OK.into(), status))
}
