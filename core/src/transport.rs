//! Blocking transport over `ureq`.
//!
//! A fresh agent is built for every request from the request's own options:
//!
//! | option          | effect                                                    |
//! |-----------------|-----------------------------------------------------------|
//! | `method`        | HTTP method, `GET` when absent                            |
//! | `header`        | CRLF-separated header lines                               |
//! | `timeout`       | overall timeout in seconds, fractions allowed             |
//! | `proxy`         | proxy URL                                                 |
//! | `user_agent`    | `User-Agent` header unless the header block has one       |
//! | `max_redirects` | redirect limit                                            |
//! | `ignore_errors` | `1`/`true`/`on`/`yes`: 4xx/5xx bodies count as success    |
//!
//! Other options are ignored. Bodies are only sent for POST, PUT and PATCH.

use std::time::Duration;

use ureq::http::Response;
use ureq::{Agent, Body, Proxy, RequestBuilder};

use crate::http::{HttpMethod, Transport, TransportFailure, TransportRequest};

/// `Transport` that performs the request with `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UreqTransport {
    fn perform(&self, request: &TransportRequest) -> Result<Vec<u8>, TransportFailure> {
        let method_name = request.option("method").unwrap_or("GET");
        let method = HttpMethod::parse(method_name)
            .ok_or_else(|| failure(format!("unsupported method `{method_name}`")))?;
        let agent = agent_for(request)?;

        let mut headers = request.headers();
        if let Some(user_agent) = request.option("user_agent") {
            if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("user-agent")) {
                headers.push(("User-Agent".to_string(), user_agent.to_string()));
            }
        }

        if !method.has_body() && !request.content.is_empty() {
            tracing::trace!(%method, bytes = request.content.len(), "dropping body of bodiless request");
        }

        let url = request.url.as_str();
        let body = request.content.as_slice();
        let result = match method {
            HttpMethod::Get => with_headers(agent.get(url), &headers).call(),
            HttpMethod::Head => with_headers(agent.head(url), &headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(url), &headers).call(),
            HttpMethod::Options => with_headers(agent.options(url), &headers).call(),
            HttpMethod::Post => with_headers(agent.post(url), &headers).send(body),
            HttpMethod::Put => with_headers(agent.put(url), &headers).send(body),
            HttpMethod::Patch => with_headers(agent.patch(url), &headers).send(body),
        };
        let mut response = result.map_err(|err| failure(err.to_string()))?;

        let status = response.status();
        let response_headers = header_text(&response);
        if status.as_u16() >= 400 && !is_enabled(request.option("ignore_errors")) {
            return Err(TransportFailure {
                detail: format!("server answered {status}"),
                response_headers,
            });
        }

        response.body_mut().read_to_vec().map_err(|err| TransportFailure {
            detail: err.to_string(),
            response_headers,
        })
    }
}

fn agent_for(request: &TransportRequest) -> Result<Agent, TransportFailure> {
    let mut config = Agent::config_builder().http_status_as_error(false);

    if let Some(timeout) = request.option("timeout") {
        let timeout = timeout
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
            .ok_or_else(|| failure(format!("invalid timeout `{timeout}`")))?;
        config = config.timeout_global(Some(timeout));
    }
    if let Some(proxy) = request.option("proxy").filter(|p| !p.trim().is_empty()) {
        let proxy = Proxy::new(proxy.trim()).map_err(|err| failure(format!("invalid proxy: {err}")))?;
        config = config.proxy(Some(proxy));
    }
    if let Some(max_redirects) = request.option("max_redirects") {
        let max_redirects = max_redirects
            .trim()
            .parse::<u32>()
            .map_err(|_| failure(format!("invalid max_redirects `{max_redirects}`")))?;
        config = config.max_redirects(max_redirects);
    }

    tracing::debug!(url = %request.url, "built transport agent");
    Ok(config.build().new_agent())
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Status line followed by the response headers, CRLF-separated.
fn header_text(response: &Response<Body>) -> String {
    let status = response.status();
    let mut text = format!(
        "{:?} {} {}",
        response.version(),
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
    .trim_end()
    .to_string();
    for (name, value) in response.headers() {
        text.push_str("\r\n");
        text.push_str(name.as_str());
        text.push_str(": ");
        text.push_str(value.to_str().unwrap_or_default());
    }
    text
}

fn is_enabled(flag: Option<&str>) -> bool {
    flag.is_some_and(|flag| {
        ["1", "true", "on", "yes"]
            .iter()
            .any(|on| flag.trim().eq_ignore_ascii_case(on))
    })
}

fn failure(detail: String) -> TransportFailure {
    TransportFailure {
        detail,
        response_headers: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(options: &[(&str, &str)]) -> TransportRequest {
        TransportRequest {
            url: "http://127.0.0.1:9/".to_string(),
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            content: Vec::new(),
        }
    }

    #[test]
    fn unsupported_method_fails_without_response() {
        let err = UreqTransport.perform(&request(&[("method", "BREW")])).unwrap_err();
        assert!(err.detail.contains("BREW"));
        assert!(err.response_headers.is_empty());
    }

    #[test]
    fn invalid_options_are_rejected() {
        assert!(agent_for(&request(&[("timeout", "soon")])).is_err());
        assert!(agent_for(&request(&[("timeout", "-1")])).is_err());
        assert!(agent_for(&request(&[("max_redirects", "many")])).is_err());
        assert!(agent_for(&request(&[("timeout", "0.5"), ("max_redirects", "3")])).is_ok());
    }

    #[test]
    fn flags() {
        assert!(is_enabled(Some("1")));
        assert!(is_enabled(Some(" TRUE ")));
        assert!(!is_enabled(Some("0")));
        assert!(!is_enabled(None));
    }
}
