//! Request executor: parameters, form fields and the send lifecycle.
//!
//! # Design
//! `HttpRequest` owns a long-lived `RequestConfig` plus the query parameters
//! and form fields set by the caller. Every `send` works on a clone of the
//! config:
//!
//! 1. the method preset's `prepare` sets `method` and the base Content-Type,
//! 2. an empty body is filled with the multipart rendering of the form fields,
//! 3. the transport performs the round-trip against the URL with the query
//!    parameters appended,
//! 4. a failure is classified from the response status line.
//!
//! The form boundary is generated once per instance and written into the
//! Content-Type `boundary` parameter at construction, so prepared clones carry
//! the same boundary the body is rendered with.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::config::RequestConfig;
use crate::error::RequestError;
use crate::form::FormPart;
use crate::http::{HttpMethod, Transport, TransportFailure, TransportRequest};
use crate::multipart::FormEncoder;
use crate::params::{self, ParamValue};
use crate::transport::UreqTransport;

static STATUS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^\s*HTTP(/[\d.]+)?[ \t]+([45]\d{2})\b(?:[ \t]+([^\r\n]*))?")
        .expect("status line pattern is valid")
});

/// Per-method preparation of a request's working config.
pub trait RequestMethod {
    /// Set the method and base Content-Type on the config about to be sent.
    fn prepare(&self, config: &mut RequestConfig);
}

/// GET preset: urlencoded Content-Type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Get;

impl RequestMethod for Get {
    fn prepare(&self, config: &mut RequestConfig) {
        config.set_option("method", HttpMethod::Get.as_str());
        config.set_content_type("application/x-www-form-urlencoded");
    }
}

/// POST preset: multipart Content-Type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Post;

impl RequestMethod for Post {
    fn prepare(&self, config: &mut RequestConfig) {
        config.set_option("method", HttpMethod::Post.as_str());
        config.set_content_type("multipart/form-data");
    }
}

/// An outbound request: config, query parameters and form fields.
///
/// `M` decides the method and base Content-Type, `T` performs the I/O.
#[derive(Debug, Clone)]
pub struct HttpRequest<M, T = UreqTransport> {
    method: M,
    transport: T,
    config: RequestConfig,
    params: Vec<(String, ParamValue)>,
    form_params: Vec<(String, FormPart)>,
    form_boundary: String,
}

impl HttpRequest<Get> {
    pub fn get() -> Self {
        Self::new(Get)
    }
}

impl HttpRequest<Post> {
    pub fn post() -> Self {
        Self::new(Post)
    }
}

impl<M: RequestMethod> HttpRequest<M> {
    pub fn new(method: M) -> Self {
        Self::with_config(method, RequestConfig::new())
    }

    /// Use `config` as the long-lived configuration.
    ///
    /// The instance's boundary is written into the config's Content-Type
    /// right away.
    pub fn with_config(method: M, mut config: RequestConfig) -> Self {
        let form_boundary = format!("------FormBoundary{}", Uuid::new_v4().simple());
        config.set_content_type_option("boundary", &form_boundary);
        Self {
            method,
            transport: UreqTransport,
            config,
            params: Vec::new(),
            form_params: Vec::new(),
            form_boundary,
        }
    }
}

impl<M, T> HttpRequest<M, T> {
    /// Swap the transport, keeping everything else.
    pub fn with_transport<U: Transport>(self, transport: U) -> HttpRequest<M, U> {
        HttpRequest {
            method: self.method,
            transport,
            config: self.config,
            params: self.params,
            form_params: self.form_params,
            form_boundary: self.form_boundary,
        }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RequestConfig {
        &mut self.config
    }

    pub fn form_boundary(&self) -> &str {
        &self.form_boundary
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        params::upsert(&mut self.params, name.into(), value.into());
    }

    pub fn form_param(&self, name: &str) -> Option<&FormPart> {
        self.form_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, part)| part)
    }

    pub fn set_form_param(&mut self, name: impl Into<String>, value: impl Into<FormPart>) {
        params::upsert(&mut self.form_params, name.into(), value.into());
    }

    /// The multipart body for the current form fields. Empty when there are
    /// none.
    pub fn form_data(&self) -> Vec<u8> {
        FormEncoder::new(&self.form_boundary).encode(&self.form_params)
    }
}

impl<M: RequestMethod, T: Transport> HttpRequest<M, T> {
    /// The config as it will be sent: prepared by the method preset, with the
    /// form body filled in when no body was set.
    pub fn prepared_config(&self) -> RequestConfig {
        let mut config = self.config.clone();
        self.method.prepare(&mut config);
        if config.content().is_empty() {
            config.set_content(self.form_data());
        }
        config
    }

    /// Send the request to `url` and return the response body.
    pub fn send(&self, url: &str) -> Result<Vec<u8>, RequestError> {
        let config = self.prepared_config();
        let request = TransportRequest {
            url: params::add_params(url, &self.params),
            options: config.options().to_vec(),
            content: config.content().to_vec(),
        };

        tracing::debug!(
            method = config.option("method").unwrap_or_default(),
            url = %request.url,
            body_bytes = request.content.len(),
            "sending request"
        );

        self.transport.perform(&request).map_err(|failure| {
            tracing::debug!(url, detail = %failure.detail, "transport failed");
            classify_failure(url, &failure)
        })
    }
}

/// Turn a transport failure into a `RequestError` using the first 4xx/5xx
/// status line of the response headers.
pub(crate) fn classify_failure(url: &str, failure: &TransportFailure) -> RequestError {
    let headers = failure.response_headers.replace("\r\n", "\n");
    let Some(caps) = STATUS_LINE.captures(&headers) else {
        return RequestError::Unreachable { url: url.to_string() };
    };

    let status: u16 = caps[2].parse().unwrap_or_default();
    if status == 404 {
        return RequestError::NotFound { url: url.to_string() };
    }
    RequestError::Status {
        url: url.to_string(),
        status,
        status_line: caps[0].trim().to_string(),
    }
}
