pub(crate) mod handshake;

use axum::http::StatusCode;

type RejectionType = (StatusCode, String);
