//! Transport options and the header text they carry.
//!
//! # Design
//! `RequestConfig` keeps the transport options as an ordered table of string
//! values, exactly what is handed to the transport. Headers live in the
//! `header` option as CRLF-separated `Name: value` lines and are edited in
//! place with per-line, case-insensitive pattern upserts rather than through a
//! parsed header map, so whatever the caller put there (ordering, duplicates,
//! unusual spacing) survives untouched unless it is the line being edited.
//!
//! The `Content-Type` line gets a small sub-editor on top: its base type is
//! the text before the first `;`, followed by `; name=value` parameters.
//!
//! The request body is kept next to the string options as bytes, since a
//! multipart body may carry binary file contents.

use std::fmt;

use regex::{Captures, Regex};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Content-Type every new config starts with.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

const HEADER: &str = "header";
const CONTENT: &str = "content";
const CONTENT_TYPE: &str = "Content-Type";

/// Transport options for one request, including the raw header block.
///
/// The `header` option always holds a `Content-Type` line. `Clone` is a full
/// value copy, which is what `HttpRequest::send` relies on to prepare a
/// request without touching the long-lived config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    options: Vec<(String, String)>,
    content: Vec<u8>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            options: vec![(HEADER.to_string(), format!("{CONTENT_TYPE}: {DEFAULT_CONTENT_TYPE}"))],
            content: Vec::new(),
        }
    }
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from an option table.
    ///
    /// A `content` entry becomes the request body. If the resulting header
    /// block has no `Content-Type` line the default one is appended.
    pub fn from_options<I, K, V>(options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut config = Self {
            options: Vec::new(),
            content: Vec::new(),
        };
        for (name, value) in options {
            config.set_option(name, value);
        }
        if !config.has_header_key(CONTENT_TYPE) {
            config.set_header_key(CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
        }
        config
    }

    /// Value of an option. `content` reads the body, when it is set and is
    /// valid UTF-8.
    pub fn option(&self, name: &str) -> Option<&str> {
        if name == CONTENT {
            if self.content.is_empty() {
                return None;
            }
            return std::str::from_utf8(&self.content).ok();
        }
        self.options
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an option, replacing any previous value in place. `content` sets
    /// the body.
    pub fn set_option(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if name == CONTENT {
            let body: String = value.into();
            self.set_content(body);
        } else {
            crate::params::upsert(&mut self.options, name, value.into());
        }
    }

    /// The full option table, in insertion order. The body is not part of it.
    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    /// Request body. Empty means "no body set yet".
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    /// Value of the first `name:` line in the header block, trimmed.
    ///
    /// Matching is case-insensitive. Returns an empty string when no line
    /// matches.
    pub fn header_key(&self, name: &str) -> String {
        let header = self.option(HEADER).unwrap_or_default();
        header_read_pattern(name)
            .and_then(|re| re.captures(header))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    }

    /// Replace every `name:` line with `name: value`, or append one.
    ///
    /// Line endings are normalized to CRLF first. Calling this twice with the
    /// same arguments leaves the header block as the first call left it.
    pub fn set_header_key(&mut self, name: &str, value: &str) {
        let header = self
            .option(HEADER)
            .unwrap_or_default()
            .replace('\r', "")
            .replace('\n', "\r\n");

        let header = match header_write_pattern(name) {
            Some(re) if re.is_match(&header) => re
                .replace_all(&header, |caps: &Captures| format!("{}: {value}", &caps[1]))
                .into_owned(),
            _ if header.is_empty() => format!("{name}: {value}"),
            _ => format!("{header}\r\n{name}: {value}"),
        };

        self.set_option(HEADER, header);
    }

    fn has_header_key(&self, name: &str) -> bool {
        let header = self.option(HEADER).unwrap_or_default();
        header_read_pattern(name).is_some_and(|re| re.is_match(header))
    }

    /// Base type of the `Content-Type` header, without parameters.
    pub fn content_type(&self) -> String {
        let value = self.header_key(CONTENT_TYPE);
        value.split(';').next().unwrap_or_default().trim().to_string()
    }

    /// Replace the base type of the `Content-Type` header, keeping its
    /// parameters.
    pub fn set_content_type(&mut self, value: &str) {
        let current = self.header_key(CONTENT_TYPE);
        let parameters = current.find(';').map(|at| &current[at..]).unwrap_or_default();
        self.set_header_key(CONTENT_TYPE, &format!("{}{parameters}", value.trim()));
    }

    /// Value of the `name` parameter of the `Content-Type` header, or an empty
    /// string.
    pub fn content_type_option(&self, name: &str) -> String {
        let content_type = self.header_key(CONTENT_TYPE);
        content_type_read_pattern(name)
            .and_then(|re| re.captures(&content_type))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    }

    /// Replace the `name` parameter of the `Content-Type` header, or append
    /// `; name=value`.
    pub fn set_content_type_option(&mut self, name: &str, value: &str) {
        let content_type = self.header_key(CONTENT_TYPE);

        let content_type = match content_type_write_pattern(name) {
            Some(re) if re.is_match(&content_type) => re
                .replace_all(&content_type, |caps: &Captures| format!("; {}={value}", &caps[1]))
                .into_owned(),
            _ => format!("{content_type}; {name}={value}"),
        };

        self.set_header_key(CONTENT_TYPE, &content_type);
    }
}

// Names are escaped, so these only fail on pathological sizes. A pattern that
// cannot be built is treated as "no match".

fn header_read_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?mi)^[ \t]*{}[ \t]*:([^\r\n]*)", regex::escape(name))).ok()
}

fn header_write_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?mi)^([ \t]*{}[ \t]*):[^\r\n]*", regex::escape(name))).ok()
}

fn content_type_read_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i);\s*{}\s*=([^;]*)", regex::escape(name))).ok()
}

fn content_type_write_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i);\s*({})\s*=\s*[^;]*", regex::escape(name))).ok()
}

// Serialized as a map of option name to value, in table order. The body is
// included as `content` when it is text; a binary body is left out.

impl Serialize for RequestConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in &self.options {
            map.serialize_entry(name, value)?;
        }
        if let Some(content) = self.option(CONTENT) {
            map.serialize_entry(CONTENT, content)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RequestConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OptionTableVisitor;

        impl<'de> Visitor<'de> for OptionTableVisitor {
            type Value = RequestConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of transport option names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut options: Vec<(String, String)> = Vec::new();
                while let Some((name, value)) = map.next_entry::<String, String>()? {
                    if options.iter().any(|(key, _)| *key == name) {
                        return Err(de::Error::custom(format!("duplicate option `{name}`")));
                    }
                    options.push((name, value));
                }
                Ok(RequestConfig::from_options(options))
            }
        }

        deserializer.deserialize_map(OptionTableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_header(header: &str) -> RequestConfig {
        let mut config = RequestConfig::new();
        config.set_option("header", header);
        config
    }

    #[test]
    fn new_config_has_default_content_type() {
        let config = RequestConfig::new();
        assert_eq!(
            config.option("header"),
            Some("Content-Type: application/x-www-form-urlencoded; charset=utf-8")
        );
        assert_eq!(config.content_type(), "application/x-www-form-urlencoded");
        assert_eq!(config.content_type_option("charset"), "utf-8");
        assert!(config.content().is_empty());
    }

    #[test]
    fn header_key_is_case_insensitive_and_trimmed() {
        let config = with_header("Accept:   text/html  \r\nX-Token: abc");
        assert_eq!(config.header_key("accept"), "text/html");
        assert_eq!(config.header_key("X-TOKEN"), "abc");
        assert_eq!(config.header_key("Missing"), "");
    }

    #[test]
    fn header_key_returns_first_occurrence() {
        let config = with_header("X-Dup: first\r\nX-Dup: second");
        assert_eq!(config.header_key("X-Dup"), "first");
    }

    #[test]
    fn header_key_does_not_match_name_prefixes() {
        let config = with_header("X-Token-Id: 7");
        assert_eq!(config.header_key("X-Token"), "");
    }

    #[test]
    fn set_header_key_replaces_existing_line() {
        let mut config = with_header("Accept: text/html\r\nX-Token: abc");
        config.set_header_key("x-token", "xyz");
        assert_eq!(config.option("header"), Some("Accept: text/html\r\nX-Token: xyz"));
    }

    #[test]
    fn set_header_key_appends_missing_line() {
        let mut config = with_header("Accept: text/html");
        config.set_header_key("X-Token", "abc");
        assert_eq!(config.option("header"), Some("Accept: text/html\r\nX-Token: abc"));
    }

    #[test]
    fn set_header_key_on_empty_header_has_no_leading_separator() {
        let mut config = with_header("");
        config.set_header_key("Accept", "*/*");
        assert_eq!(config.option("header"), Some("Accept: */*"));
    }

    #[test]
    fn set_header_key_normalizes_line_endings() {
        let mut config = with_header("Accept: text/html\nX-Token: abc\r\nX-Other: 1");
        config.set_header_key("X-Token", "xyz");
        assert_eq!(
            config.option("header"),
            Some("Accept: text/html\r\nX-Token: xyz\r\nX-Other: 1")
        );
    }

    #[test]
    fn set_header_key_replaces_every_duplicate() {
        let mut config = with_header("X-Dup: first\r\nX-Dup: second");
        config.set_header_key("X-Dup", "third");
        assert_eq!(config.option("header"), Some("X-Dup: third\r\nX-Dup: third"));
    }

    #[test]
    fn set_header_key_is_idempotent() {
        let mut config = with_header("  accept : text/html\nHost: example.com");
        config.set_header_key("Accept", "*/*");
        let once = config.clone();
        config.set_header_key("Accept", "*/*");
        assert_eq!(config, once);
        assert_eq!(config.option("header"), Some("  accept : */*\r\nHost: example.com"));
    }

    #[test]
    fn set_header_key_inserts_value_literally() {
        let mut config = with_header("X-Price: 1");
        config.set_header_key("X-Price", "$1 and ${2}");
        assert_eq!(config.header_key("X-Price"), "$1 and ${2}");
    }

    #[test]
    fn set_content_type_keeps_parameters() {
        let mut config = with_header("Content-Type: text/plain; charset=utf-8");
        config.set_content_type("application/json");
        assert_eq!(config.header_key("Content-Type"), "application/json; charset=utf-8");
        assert_eq!(config.content_type(), "application/json");
    }

    #[test]
    fn set_content_type_without_parameters() {
        let mut config = with_header("Content-Type: text/plain");
        config.set_content_type("  text/html ");
        assert_eq!(config.header_key("Content-Type"), "text/html");
    }

    #[test]
    fn content_type_option_upsert() {
        let mut config = with_header("Content-Type: multipart/form-data; boundary=X");
        config.set_content_type_option("boundary", "Y");
        assert_eq!(config.header_key("Content-Type"), "multipart/form-data; boundary=Y");

        config.set_content_type_option("charset", "utf-8");
        assert_eq!(
            config.header_key("Content-Type"),
            "multipart/form-data; boundary=Y; charset=utf-8"
        );
        assert_eq!(config.content_type_option("boundary"), "Y");
        assert_eq!(config.content_type_option("CHARSET"), "utf-8");
        assert_eq!(config.content_type_option("missing"), "");
    }

    #[test]
    fn set_content_type_option_is_idempotent() {
        let mut config = RequestConfig::new();
        config.set_content_type_option("boundary", "abc");
        let once = config.clone();
        config.set_content_type_option("boundary", "abc");
        assert_eq!(config, once);
    }

    #[test]
    fn set_option_keeps_most_recent_value_in_place() {
        let mut config = RequestConfig::new();
        config.set_option("method", "GET");
        config.set_option("timeout", "5");
        config.set_option("method", "POST");

        let names: Vec<&str> = config.options().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["header", "method", "timeout"]);
        assert_eq!(config.option("method"), Some("POST"));
        assert_eq!(config.option("proxy"), None);
    }

    #[test]
    fn clone_is_independent() {
        let mut original = RequestConfig::new();
        original.set_content_type_option("boundary", "B");
        let mut copy = original.clone();
        copy.set_option("method", "POST");
        copy.set_content_type("multipart/form-data");

        assert_eq!(original.option("method"), None);
        assert_eq!(original.content_type(), "application/x-www-form-urlencoded");
        assert_eq!(copy.content_type_option("boundary"), "B");
    }

    #[test]
    fn from_options_restores_content_type() {
        let config = RequestConfig::from_options([("header", "Accept: */*"), ("timeout", "3")]);
        assert_eq!(
            config.option("header"),
            Some("Accept: */*\r\nContent-Type: application/x-www-form-urlencoded; charset=utf-8")
        );

        let config = RequestConfig::from_options([("content", "a=1")]);
        assert_eq!(config.content(), b"a=1");
        assert_eq!(config.content_type(), "application/x-www-form-urlencoded");
    }

    #[test]
    fn deserializes_from_json_object() {
        let config: RequestConfig = serde_json::from_str(
            r#"{"method":"POST","header":"Content-Type: text/plain","timeout":"2.5"}"#,
        )
        .unwrap();
        assert_eq!(config.option("method"), Some("POST"));
        assert_eq!(config.content_type(), "text/plain");

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], "2.5");
        assert_eq!(json["header"], "Content-Type: text/plain");
    }

    #[test]
    fn content_option_is_the_body() {
        let mut config = RequestConfig::new();
        assert_eq!(config.option("content"), None);

        config.set_option("content", "raw body");
        assert_eq!(config.content(), b"raw body");
        assert_eq!(config.option("content"), Some("raw body"));
        assert!(config.options().iter().all(|(name, _)| name != "content"));

        config.set_content("x=1");
        assert_eq!(config.option("content"), Some("x=1"));

        config.set_content(vec![0xff, 0xfe]);
        assert_eq!(config.option("content"), None);
    }

    #[test]
    fn binary_body_is_left_out_of_serialization() {
        let mut config = RequestConfig::new();
        config.set_option("method", "POST");
        config.set_content(vec![0x89, b'P', b'N', b'G', 0xff]);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["method"], "POST");
        assert!(json.get("content").is_none());

        config.set_content("name=Alice");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["content"], "name=Alice");
    }

    #[test]
    fn rejects_duplicate_options() {
        let result: Result<RequestConfig, _> =
            serde_json::from_str(r#"{"method":"GET","method":"POST"}"#);
        assert!(result.is_err());
    }
}
