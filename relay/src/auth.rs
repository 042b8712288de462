use crate::connection::Identity;
use std::collections::HashMap;

/// Handshake header carrying the client's device id.
pub const IDENTITY_HEADER: &str = "name";

/// Header mapping captured at connection time. Keys are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeHeaders {
    headers: HashMap<String, String>,
}

impl HandshakeHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, keeping the first value seen for a name.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .entry(name.as_ref().to_ascii_lowercase())
            .or_insert_with(|| value.into());
    }

    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HandshakeHeaders
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HandshakeHeaders::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Resolves the connecting client's identity from its handshake headers.
/// The value is taken verbatim; blank or missing device ids resolve to `None`.
pub fn identity_from_handshake(headers: &HandshakeHeaders) -> Option<Identity> {
    headers
        .get(IDENTITY_HEADER)
        .filter(|name| !name.trim().is_empty())
        .map(Identity::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_name_header() {
        let headers = HandshakeHeaders::new().with("name", "device-7");
        assert_eq!(
            identity_from_handshake(&headers),
            Some(Identity::from("device-7"))
        );
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let headers = HandshakeHeaders::new().with("Name", "alice");
        assert_eq!(identity_from_handshake(&headers), Some(Identity::from("alice")));
    }

    #[test]
    fn test_identity_value_is_kept_verbatim() {
        let headers = HandshakeHeaders::new().with("name", " alice ");
        assert_eq!(
            identity_from_handshake(&headers),
            Some(Identity::from(" alice "))
        );
    }

    #[test]
    fn test_missing_or_blank_identity_is_rejected() {
        assert_eq!(identity_from_handshake(&HandshakeHeaders::new()), None);
        let blank = HandshakeHeaders::new().with("name", "   ");
        assert_eq!(identity_from_handshake(&blank), None);
    }

    #[test]
    fn test_first_value_wins() {
        let headers: HandshakeHeaders = [("name", "alice"), ("NAME", "bob")].into_iter().collect();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("name"), Some("alice"));
    }
}
