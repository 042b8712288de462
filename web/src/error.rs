use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use relay::Error as RelayError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(RelayError);

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.0)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0 {
            RelayError::AuthenticationFailed | RelayError::Unauthenticated(_) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED").into_response()
            }
            RelayError::RecipientOffline(_) => (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<RelayError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay::ConnectionId;

    #[test]
    fn test_status_codes() {
        let cases = [
            (RelayError::AuthenticationFailed, StatusCode::UNAUTHORIZED),
            (
                RelayError::Unauthenticated(ConnectionId::next()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                RelayError::RecipientOffline("carol".into()),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (relay_error, expected) in cases {
            assert_eq!(Error::from(relay_error).into_response().status(), expected);
        }
    }
}
