//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The client builds `HttpRequest`
//! values and interprets `HttpResponse` values; a `Transport` implementation
//! moves bytes in between. Every call the service supports is a GET, so a
//! request is just a fully-encoded URL plus headers.

/// An outgoing GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Canonical reason phrase for the status code, or empty if unknown.
    pub fn reason(&self) -> &'static str {
        http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            url: "https://api.example.com/v1/posts/get".into(),
            headers: vec![("Authorization".into(), "Basic abc".into())],
        };
        assert_eq!(req.header("authorization"), Some("Basic abc"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn reason_phrase_from_status() {
        assert_eq!(HttpResponse::new(500, "").reason(), "Internal Server Error");
        assert_eq!(HttpResponse::new(429, "").reason(), "Too Many Requests");
        assert_eq!(HttpResponse::new(599, "").reason(), "");
    }
}
