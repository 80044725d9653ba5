//! HTTP response handling.
//!
//! [`Response`] is what a [`Transport`](crate::Transport) hands back: status,
//! headers and a buffered body that can be read once, in one of the four
//! decodings. [`decode`] dispatches a [`ResponseType`] to the matching read.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use derive_more::{Display, Error, From};

use crate::ResponseType;

/// Error raised while turning a response body into its declared shape.
#[derive(Debug, Display, Error, From)]
pub enum DecodeError {
    /// The body was already read.
    #[display("response body has already been read")]
    #[from(skip)]
    BodyUsed,

    /// The body is not valid JSON.
    #[display("invalid JSON body: {_0}")]
    #[from]
    Json(serde_json::Error),

    /// The decoded value does not match the expected response type.
    #[display("decoded body does not match the `{expected}` response type")]
    #[from(skip)]
    Mismatch {
        /// Response type the caller expected.
        expected: ResponseType,
    },
}

/// Binary object: bytes plus the content type they were served with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    content_type: String,
    data: Bytes,
}

impl Blob {
    /// Creates a blob. An empty content type means "unknown".
    #[must_use]
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Content type, empty when unknown.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Blob bytes.
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the blob holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume into the bytes.
    #[must_use]
    pub fn into_data(self) -> Bytes {
        self.data
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// Text decoding.
    Text(String),
    /// JSON decoding.
    Json(serde_json::Value),
    /// Blob decoding.
    Blob(Blob),
    /// Byte buffer decoding.
    ArrayBuffer(Bytes),
}

/// HTTP response with status, headers, and a body readable once.
#[derive(Debug)]
pub struct Response {
    status: u16,
    status_text: String,
    headers: HashMap<String, String>,
    body: Bytes,
    body_used: AtomicBool,
}

impl Response {
    /// Creates a new response. The status text is the canonical reason phrase.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: impl Into<Bytes>) -> Self {
        let status_text = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default();

        Self {
            status,
            status_text: status_text.to_string(),
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_lowercase(), value))
                .collect(),
            body: body.into(),
            body_used: AtomicBool::new(false),
        }
    }

    /// Replace the status text.
    #[must_use]
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// HTTP status text.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Response headers, keys lower-cased.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Returns `true` once the body has been read.
    #[must_use]
    pub fn body_used(&self) -> bool {
        self.body_used.load(Ordering::Acquire)
    }

    fn take_body(&self) -> Result<Bytes, DecodeError> {
        if self.body_used.swap(true, Ordering::AcqRel) {
            return Err(DecodeError::BodyUsed);
        }
        Ok(self.body.clone())
    }

    /// Read the body as text. Invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> Result<String, DecodeError> {
        let body = self.take_body()?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Read the body as a JSON document.
    pub fn json(&self) -> Result<serde_json::Value, DecodeError> {
        let body = self.take_body()?;
        serde_json::from_slice(&body).map_err(Into::into)
    }

    /// Read the body as a [`Blob`] tagged with the `content-type` header.
    pub fn blob(&self) -> Result<Blob, DecodeError> {
        let body = self.take_body()?;
        let content_type = self.header("content-type").unwrap_or_default();
        Ok(Blob::new(content_type, body))
    }

    /// Read the body as raw bytes.
    pub fn array_buffer(&self) -> Result<Bytes, DecodeError> {
        self.take_body()
    }
}

/// Decode a response body according to `response_type`.
///
/// `Raw` returns `None` without touching the body.
pub fn decode(
    response: &Response,
    response_type: ResponseType,
) -> Result<Option<ResponseData>, DecodeError> {
    let data = match response_type {
        ResponseType::Raw => return Ok(None),
        ResponseType::Text => ResponseData::Text(response.text()?),
        ResponseType::Json => ResponseData::Json(response.json()?),
        ResponseType::Blob => ResponseData::Blob(response.blob()?),
        ResponseType::ArrayBuffer => ResponseData::ArrayBuffer(response.array_buffer()?),
    };
    Ok(Some(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &'static str) -> Response {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Response::new(status, headers, body)
    }

    #[test]
    fn response_basic() {
        let response = response(200, r#"{"id":1}"#);

        assert_eq!(response.status(), 200);
        assert_eq!(response.status_text(), "OK");
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert!(response.ok());
        assert!(!response.body_used());
    }

    #[test]
    fn response_ok_range() {
        assert!(!response(199, "").ok());
        assert!(response(204, "").ok());
        assert!(!response(301, "").ok());
        assert!(!response(404, "").ok());
        assert_eq!(response(404, "").status_text(), "Not Found");
    }

    #[test]
    fn body_can_be_read_once() {
        let response = response(200, "hello");

        assert_eq!(response.text().expect("first read"), "hello");
        assert!(response.body_used());
        assert!(matches!(response.json(), Err(DecodeError::BodyUsed)));
    }

    #[test]
    fn decode_dispatches_on_response_type() {
        let json = decode(&response(200, r#"{"id":1}"#), ResponseType::Json).expect("json");
        assert_eq!(json, Some(ResponseData::Json(serde_json::json!({"id": 1}))));

        let text = decode(&response(200, "plain"), ResponseType::Text).expect("text");
        assert_eq!(text, Some(ResponseData::Text("plain".to_string())));

        let blob = decode(&response(200, "bin"), ResponseType::Blob).expect("blob");
        assert_eq!(
            blob,
            Some(ResponseData::Blob(Blob::new("application/json", "bin")))
        );

        let buffer =
            decode(&response(200, "buf"), ResponseType::ArrayBuffer).expect("arraybuffer");
        assert_eq!(
            buffer,
            Some(ResponseData::ArrayBuffer(Bytes::from_static(b"buf")))
        );
    }

    #[test]
    fn decode_raw_leaves_body_unread() {
        let response = response(200, "untouched");

        let data = decode(&response, ResponseType::Raw).expect("raw");

        assert!(data.is_none());
        assert!(!response.body_used());
    }

    #[test]
    fn decode_malformed_json_fails() {
        let err = decode(&response(200, "not json"), ResponseType::Json).expect_err("malformed");
        assert!(matches!(err, DecodeError::Json(_)));
    }
}
