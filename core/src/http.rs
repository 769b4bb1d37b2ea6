//! Transport boundary types.
//!
//! # Design
//! The core never opens a socket itself. `HttpRequest::send` produces a
//! `TransportRequest` (final URL, option table, body) and hands it to a
//! `Transport`, which performs the blocking round-trip and returns either the
//! response payload or a `TransportFailure`. A failure carries whatever raw
//! response header text the transport received, since that is the only thing
//! the core uses to classify it.
//!
//! All fields use owned types so requests can be queued or logged by a
//! transport without lifetime concerns.

use std::fmt;

/// HTTP method of a request preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Parse a method name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Self> {
        [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Delete,
            HttpMethod::Head,
            HttpMethod::Options,
        ]
        .into_iter()
        .find(|method| method.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Whether requests with this method carry a body.
    pub fn has_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully prepared request, described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Target URL with the query parameters already appended.
    pub url: String,
    /// Transport options, including `method` and `header`.
    pub options: Vec<(String, String)>,
    /// Request body, possibly empty.
    pub content: Vec<u8>,
}

impl TransportRequest {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The `header` option split into `(name, value)` pairs.
    ///
    /// Lines without a colon are skipped.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.option("header")
            .unwrap_or_default()
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .filter(|(name, _)| !name.is_empty())
            .collect()
    }
}

/// A failed round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportFailure {
    /// Human-readable cause, for logging only.
    pub detail: String,
    /// Raw response header text, status line first. Empty when no response
    /// was received.
    pub response_headers: String,
}

/// Performs the blocking HTTP round-trip for a prepared request.
pub trait Transport {
    fn perform(&self, request: &TransportRequest) -> Result<Vec<u8>, TransportFailure>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn perform(&self, request: &TransportRequest) -> Result<Vec<u8>, TransportFailure> {
        (**self).perform(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names() {
        assert_eq!(HttpMethod::parse("post"), Some(HttpMethod::Post));
        assert_eq!(HttpMethod::parse(" GET "), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("BREW"), None);
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert!(HttpMethod::Patch.has_body());
        assert!(!HttpMethod::Head.has_body());
    }

    #[test]
    fn headers_are_split_per_line() {
        let request = TransportRequest {
            url: "http://localhost".to_string(),
            options: vec![(
                "header".to_string(),
                "Content-Type: text/plain; charset=utf-8\r\nbogus line\r\nX-Token:  abc \r\n".to_string(),
            )],
            content: Vec::new(),
        };
        assert_eq!(
            request.headers(),
            vec![
                ("Content-Type".to_string(), "text/plain; charset=utf-8".to_string()),
                ("X-Token".to_string(), "abc".to_string()),
            ]
        );
        assert_eq!(request.option("method"), None);
    }
}
