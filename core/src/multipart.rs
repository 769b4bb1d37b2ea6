//! `multipart/form-data` body rendering.
//!
//! # Layout
//! Each item of each field becomes one part:
//!
//! ```text
//! --<boundary>
//! Content-Disposition: form-data; name="<name>[<index>]"; filename=<urlencoded>
//! Content-Type: <mime type>
//!
//! <payload>
//! ```
//!
//! Lines are joined with a bare `\n` and empty segments are dropped, so an
//! unset MIME type leaves no blank line behind. The `[<index>]` suffix is
//! present only for list payloads and the `filename` attribute only when one is
//! set. The body ends with `--<boundary>--\r\n`.

use crate::form::FormPart;

/// Renders form fields as a multipart body with a fixed boundary.
#[derive(Debug, Clone, Copy)]
pub struct FormEncoder<'a> {
    boundary: &'a str,
}

impl<'a> FormEncoder<'a> {
    pub fn new(boundary: &'a str) -> Self {
        Self { boundary }
    }

    /// Render `fields` in order. No fields, no body.
    pub fn encode(&self, fields: &[(String, FormPart)]) -> Vec<u8> {
        if fields.is_empty() {
            return Vec::new();
        }

        let delimiter = format!("--{}", self.boundary);
        let mut body = Vec::new();

        for (name, part) in fields {
            let data = part.data();
            let is_multiple = data.is_multiple();
            let name = name.replace('"', "\\\"");

            for (index, item) in data.items().into_iter().enumerate() {
                let mut disposition = if is_multiple {
                    format!("Content-Disposition: form-data; name=\"{name}[{index}]\"")
                } else {
                    format!("Content-Disposition: form-data; name=\"{name}\"")
                };
                if !part.filename().is_empty() {
                    disposition.push_str("; filename=");
                    disposition.push_str(&urlencode(part.filename()));
                }

                let content_type = if part.mime_type().is_empty() {
                    String::new()
                } else {
                    format!("Content-Type: {}", part.mime_type())
                };

                let mut payload = Vec::with_capacity(item.len() + 1);
                payload.push(b'\n');
                payload.extend_from_slice(item);

                let rendered = concat(
                    b"\n",
                    &[
                        delimiter.as_bytes(),
                        disposition.as_bytes(),
                        content_type.as_bytes(),
                        &payload,
                    ],
                );
                body = concat(b"\n", &[&body, &rendered]);
            }
        }

        let closing = format!("{delimiter}--\r\n");
        concat(b"\n", &[&body, closing.as_bytes()])
    }
}

/// `application/x-www-form-urlencoded` form of `value`, with `*` escaped as
/// well.
fn urlencode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
}

/// Join the non-empty `segments` with `separator`.
fn concat(separator: &[u8], segments: &[&[u8]]) -> Vec<u8> {
    let mut joined = Vec::new();
    for segment in segments.iter().filter(|s| !s.is_empty()) {
        if !joined.is_empty() {
            joined.extend_from_slice(separator);
        }
        joined.extend_from_slice(segment);
    }
    joined
}
