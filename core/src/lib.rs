//! Outbound HTTP request builder.
//!
//! # Overview
//! Accumulates query parameters and form fields, renders a
//! `multipart/form-data` body when needed, edits the raw header block of the
//! transport options (in particular `Content-Type` and its parameters), and
//! performs one blocking request, turning transport and HTTP-status failures
//! into a `RequestError`.
//!
//! ```no_run
//! use request_core::{FormPart, HttpRequest};
//!
//! let mut request = HttpRequest::post();
//! request.set_param("lang", "en");
//! request.set_form_param("name", "Alice");
//! request.set_form_param("tags", vec!["a", "b"]);
//! request.set_form_param("avatar", FormPart::file("avatar.png", None, None)?);
//! let _body = request.send("https://example.com/profile")?;
//! # Ok::<(), request_core::RequestError>(())
//! ```
//!
//! # Design
//! - `RequestConfig` keeps headers as text edited by idempotent per-line
//!   upserts, so the option table handed to the transport is exactly what
//!   the caller sees through `options()`.
//! - `HttpRequest::send` never mutates the instance: it prepares a clone of
//!   the config, fills the body, and dispatches.
//! - I/O sits behind the `Transport` trait. `UreqTransport` is the default;
//!   tests plug in canned transports.

pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod multipart;
pub mod params;
pub mod transport;

pub use client::{Get, HttpRequest, Post, RequestMethod};
pub use config::{RequestConfig, DEFAULT_CONTENT_TYPE};
pub use error::RequestError;
pub use form::{detect_mime_type, FormData, FormPart};
pub use http::{HttpMethod, Transport, TransportFailure, TransportRequest};
pub use multipart::FormEncoder;
pub use params::{add_params, ParamValue};
pub use transport::UreqTransport;
