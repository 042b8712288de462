use crate::extractors::RejectionType;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use relay::HandshakeHeaders;
use std::collections::HashMap;

/// Handshake headers for the relay, built from the upgrade request.
///
/// Browsers cannot attach custom headers to a WebSocket upgrade, so query
/// parameters are accepted as well. Real headers take precedence.
pub(crate) struct Handshake(pub HandshakeHeaders);

#[async_trait]
impl<S> FromRequestParts<S> for Handshake
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let mut handshake = HandshakeHeaders::new();

        for (name, value) in parts.headers.iter() {
            if let Ok(value) = value.to_str() {
                handshake.insert(name.as_str(), value);
            }
        }

        let Query(params) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| (rejection.status(), rejection.body_text()))?;
        for (name, value) in params {
            handshake.insert(name, value);
        }

        Ok(Handshake(handshake))
    }
}
