//! Error types for the request builder.
//!
//! # Design
//! A failed `send` is classified from the response status line the transport
//! hands back. `NotFound` gets a dedicated variant because callers frequently
//! distinguish "the URL does not exist" from "the server refused the
//! request". Every other 4xx/5xx lands in `Status` with the raw status line,
//! and a failure without any status line (connection refused, DNS, timeout)
//! becomes `Unreachable`. The transport's own error detail is not preserved
//! beyond what the status line says.
//!
//! The two file-backed form part failures live in the same enum so callers
//! deal with a single error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `HttpRequest::send` and `FormPart::file`.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server answered 404.
    #[error("Url not found: {url}")]
    NotFound { url: String },

    /// The server answered with a 4xx/5xx status other than 404.
    #[error("Failed to open {url}:\n{status_line}")]
    Status {
        url: String,
        status: u16,
        status_line: String,
    },

    /// The transport failed without a usable HTTP status line.
    #[error("Failed to open {url}")]
    Unreachable { url: String },

    /// The MIME type of a file-backed form part could not be detected.
    #[error("Error detecting MIME type of {}", path.display())]
    MimeDetection { path: PathBuf },

    /// A file-backed form part could not be read.
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RequestError {
    /// Whether this error was raised by a failed `send`.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            RequestError::NotFound { .. } | RequestError::Status { .. } | RequestError::Unreachable { .. }
        )
    }

    /// HTTP status behind the failure, when the response carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::NotFound { .. } => Some(404),
            RequestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
