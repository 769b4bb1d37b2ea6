//! Form fields destined for a multipart body.
//!
//! # Design
//! A `FormPart` is one named value of the form: its payload plus the optional
//! per-part MIME type and filename. Empty strings mean "not set" for both, so
//! the encoder omits the matching header or attribute.
//!
//! Whether a payload is a list is part of its type (`FormData::Multiple`), not
//! something the encoder infers from the values. A one-element list is still
//! a list and still gets an index suffix.

use std::fs;
use std::path::Path;

use crate::error::RequestError;

/// Payload of a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormData {
    Single(Vec<u8>),
    Multiple(Vec<Vec<u8>>),
}

impl FormData {
    /// The payload as a list of items, one per part to emit.
    pub fn items(&self) -> Vec<&[u8]> {
        match self {
            FormData::Single(item) => vec![item.as_slice()],
            FormData::Multiple(items) => items.iter().map(Vec::as_slice).collect(),
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, FormData::Multiple(_))
    }
}

impl From<&str> for FormData {
    fn from(value: &str) -> Self {
        FormData::Single(value.as_bytes().to_vec())
    }
}

impl From<String> for FormData {
    fn from(value: String) -> Self {
        FormData::Single(value.into_bytes())
    }
}

impl From<Vec<u8>> for FormData {
    fn from(value: Vec<u8>) -> Self {
        FormData::Single(value)
    }
}

impl From<Vec<&str>> for FormData {
    fn from(values: Vec<&str>) -> Self {
        FormData::Multiple(values.into_iter().map(|v| v.as_bytes().to_vec()).collect())
    }
}

impl From<Vec<String>> for FormData {
    fn from(values: Vec<String>) -> Self {
        FormData::Multiple(values.into_iter().map(String::into_bytes).collect())
    }
}

/// One form field: payload, MIME type and filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    data: FormData,
    mime_type: String,
    filename: String,
}

impl FormPart {
    pub fn new(data: impl Into<FormData>) -> Self {
        Self {
            data: data.into(),
            mime_type: String::new(),
            filename: String::new(),
        }
    }

    /// Build a part from the contents of a file.
    ///
    /// The file is read eagerly. Without an explicit MIME type one is
    /// detected from the contents; without an explicit filename the file's
    /// base name is used.
    pub fn file(
        path: impl AsRef<Path>,
        mime_type: Option<&str>,
        filename: Option<&str>,
    ) -> Result<Self, RequestError> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|source| RequestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let mime_type = match mime_type.filter(|m| !m.is_empty()) {
            Some(mime_type) => mime_type.to_string(),
            None => detect_mime_type(&contents, path).ok_or_else(|| RequestError::MimeDetection {
                path: path.to_path_buf(),
            })?,
        };

        let filename = match filename.filter(|f| !f.is_empty()) {
            Some(filename) => filename.to_string(),
            None => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        Ok(Self {
            data: FormData::Single(contents),
            mime_type,
            filename,
        })
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn set_mime_type(&mut self, mime_type: impl Into<String>) {
        self.mime_type = mime_type.into();
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }
}

impl From<FormData> for FormPart {
    fn from(data: FormData) -> Self {
        FormPart::new(data)
    }
}

impl From<&str> for FormPart {
    fn from(value: &str) -> Self {
        FormPart::new(value)
    }
}

impl From<String> for FormPart {
    fn from(value: String) -> Self {
        FormPart::new(value)
    }
}

impl From<Vec<&str>> for FormPart {
    fn from(values: Vec<&str>) -> Self {
        FormPart::new(values)
    }
}

impl From<Vec<String>> for FormPart {
    fn from(values: Vec<String>) -> Self {
        FormPart::new(values)
    }
}

/// Guess the MIME type of file contents.
///
/// Magic numbers win, then the file extension, then `text/plain` for valid
/// UTF-8. Returns `None` for unrecognized binary data.
pub fn detect_mime_type(contents: &[u8], path: &Path) -> Option<String> {
    if let Some(kind) = infer::get(contents) {
        return Some(kind.mime_type().to_string());
    }
    if let Some(mime_type) = mime_guess::from_path(path).first_raw() {
        return Some(mime_type.to_string());
    }
    if std::str::from_utf8(contents).is_ok() {
        return Some("text/plain".to_string());
    }
    None
}
