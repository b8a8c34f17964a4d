//! Connection-establishment metadata.
//!
//! Everything the client sent before the duplex channel opened: the
//! upgrade request's headers and its query string. Credentials travel
//! here, never in the message stream.

/// Headers and query string captured from a connection's opening handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeMetadata {
    headers: Vec<(String, String)>,
    query: Option<String>,
}

impl HandshakeMetadata {
    /// Creates metadata with no headers and no query string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header. Names are stored lowercased.
    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.push_header(name, value);
        self
    }

    /// Sets the raw query string (without the leading `?`).
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.set_query(query);
        self
    }

    pub(crate) fn set_query(&mut self, query: impl Into<String>) {
        self.query = Some(query.into());
    }

    pub(crate) fn push_header(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.headers
            .push((name.into().to_ascii_lowercase(), value.into()));
    }

    /// Returns the first value of the named header, matched
    /// case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of the named cookie from the `Cookie` header(s).
    ///
    /// `token=abc; theme=dark` → `cookie("token") == Some("abc")`.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k == "cookie")
            .flat_map(|(_, v)| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// Returns the value of the named query parameter, undecoded.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .as_deref()?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let meta = HandshakeMetadata::new()
            .with_header("Authorization", "Bearer abc");
        assert_eq!(meta.header("authorization"), Some("Bearer abc"));
        assert_eq!(meta.header("AUTHORIZATION"), Some("Bearer abc"));
        assert_eq!(meta.header("cookie"), None);
    }

    #[test]
    fn test_cookie_parses_multiple_pairs() {
        let meta = HandshakeMetadata::new()
            .with_header("Cookie", "theme=dark; token=abc.def; lang=en");
        assert_eq!(meta.cookie("token"), Some("abc.def"));
        assert_eq!(meta.cookie("lang"), Some("en"));
        assert_eq!(meta.cookie("session"), None);
    }

    #[test]
    fn test_cookie_spans_repeated_headers() {
        let meta = HandshakeMetadata::new()
            .with_header("Cookie", "theme=dark")
            .with_header("Cookie", "token=xyz");
        assert_eq!(meta.cookie("token"), Some("xyz"));
    }

    #[test]
    fn test_cookie_does_not_match_prefix() {
        // `mytoken` must not satisfy a lookup for `token`.
        let meta =
            HandshakeMetadata::new().with_header("Cookie", "mytoken=nope");
        assert_eq!(meta.cookie("token"), None);
    }

    #[test]
    fn test_query_param() {
        let meta = HandshakeMetadata::new().with_query("a=1&token=t0k");
        assert_eq!(meta.query_param("token"), Some("t0k"));
        assert_eq!(meta.query_param("b"), None);
        assert_eq!(HandshakeMetadata::new().query_param("token"), None);
    }
}
