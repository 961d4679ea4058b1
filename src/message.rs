//! Message envelope exchanged with the routing layer.
//!
//! A [`Message`] carries a [`Body`] and a map of string headers. The queue
//! endpoints read and write exactly two headers: [`SENDER_INFORMATION`] and
//! [`KEY`].
//!
//! [`SENDER_INFORMATION`]: crate::constants::SENDER_INFORMATION
//! [`KEY`]: crate::constants::KEY

use crate::error::{Error, Result};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Payload representation of a queue endpoint.
///
/// Selected by static configuration, never inferred from the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Entries travel as raw bytes.
    Binary,
    /// Entries travel as UTF-8 text.
    #[default]
    Text,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => f.write_str("binary"),
            Self::Text => f.write_str("text"),
        }
    }
}

/// Message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Binary(Vec<u8>),
    Text(String),
}

impl Body {
    /// Borrow the payload as bytes, validating it against `format`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a text endpoint is handed a
    /// binary body that is not valid UTF-8.
    pub fn payload(&self, format: Format) -> Result<Cow<'_, [u8]>> {
        match (self, format) {
            (Self::Binary(bytes), Format::Binary) => Ok(Cow::Borrowed(bytes)),
            (Self::Text(text), _) => Ok(Cow::Borrowed(text.as_bytes())),
            (Self::Binary(bytes), Format::Text) => std::str::from_utf8(bytes)
                .map(|s| Cow::Borrowed(s.as_bytes()))
                .map_err(|e| Error::configuration(format!("message body is not valid text: {e}"))),
        }
    }

    /// Body as text, if it is text or UTF-8 bytes.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(bytes) => std::str::from_utf8(bytes).ok(),
        }
    }

    /// Body as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Header value; keys of binary endpoints are raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl HeaderValue {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for HeaderValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// A routed message: payload plus string-keyed headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    body: Body,
    headers: BTreeMap<String, HeaderValue>,
}

impl Message {
    /// Create a message with no headers.
    pub fn new(body: impl Into<Body>) -> Self {
        Self {
            body: body.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Builder-style header setter.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Exact-name header lookup.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Header lookup tolerant of upstream casing.
    ///
    /// Tries `name` as given, then its lowercase form.
    pub fn header_any_case(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .get(name)
            .or_else(|| self.headers.get(&name.to_lowercase()))
    }

    pub fn headers(&self) -> &BTreeMap<String, HeaderValue> {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::KEY;

    #[test]
    fn test_header_any_case_prefers_canonical() {
        let msg = Message::new("body")
            .with_header("key", "lower")
            .with_header(KEY, "upper");
        assert_eq!(msg.header_any_case(KEY), Some(&HeaderValue::from("upper")));
    }

    #[test]
    fn test_header_any_case_falls_back_to_lowercase() {
        let msg = Message::new("body").with_header("key", "lower");
        assert_eq!(msg.header(KEY), None);
        assert_eq!(msg.header_any_case(KEY), Some(&HeaderValue::from("lower")));
    }

    #[test]
    fn test_header_any_case_ignores_mixed_case() {
        let msg = Message::new("body").with_header("Key", "mixed");
        assert_eq!(msg.header_any_case(KEY), None);
    }

    #[test]
    fn test_text_payload_rejects_invalid_utf8() {
        let body = Body::Binary(vec![0xff, 0xfe]);
        assert!(body.payload(Format::Binary).is_ok());
        let err = body.payload(Format::Text).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_format_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: Format,
        }
        let w: Wrapper = toml::from_str("format = \"binary\"").unwrap();
        assert_eq!(w.format, Format::Binary);
        assert_eq!(Format::default(), Format::Text);
    }
}
