//! Multipart form bodies.
//!
//! A [`Form`] is passed through the body serializer as an opaque payload: it
//! is encoded to `multipart/form-data` bytes with its own boundary.
//!
//! ```
//! use courier_core::{Form, Part};
//!
//! let form = Form::with_boundary("xyz")
//!     .text("title", "Groceries")
//!     .part(Part::file("attachment", "list.csv", "milk,eggs"));
//!
//! assert_eq!(form.content_type(), "multipart/form-data; boundary=xyz");
//! ```

use bytes::{BufMut, Bytes, BytesMut};

const DEFAULT_PART_TYPE: &str = "application/octet-stream";

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// Untyped part.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: data.into(),
        }
    }

    /// Text field, without content type like a browser form field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value.into())
    }

    /// File part. The content type is derived from the file extension.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename);
        Self {
            name: name.into(),
            filename: Some(filename),
            content_type: Some(content_type.to_string()),
            data: data.into(),
        }
    }

    /// Override the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name, for file parts.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Part payload.
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    fn write_to(&self, boundary: &str, buf: &mut BytesMut) {
        buf.put_slice(b"--");
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(b"\r\nContent-Disposition: form-data; name=\"");
        buf.put_slice(escape_quoted(&self.name).as_bytes());
        buf.put_u8(b'"');
        if let Some(filename) = &self.filename {
            buf.put_slice(b"; filename=\"");
            buf.put_slice(escape_quoted(filename).as_bytes());
            buf.put_u8(b'"');
        }
        buf.put_slice(b"\r\n");
        if let Some(content_type) = &self.content_type {
            buf.put_slice(b"Content-Type: ");
            buf.put_slice(content_type.as_bytes());
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(b"\r\n");
        buf.put_slice(&self.data);
        buf.put_slice(b"\r\n");
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn content_type_for(filename: &str) -> &'static str {
    let Some((_, extension)) = filename.rsplit_once('.') else {
        return DEFAULT_PART_TYPE;
    };

    match extension.to_ascii_lowercase().as_str() {
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => DEFAULT_PART_TYPE,
    }
}

/// A `multipart/form-data` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Empty form with a generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Empty form with a fixed boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Append a part.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Append a text field.
    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(Part::text(name, value))
    }

    /// Boundary delimiting parts.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Parts in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// `Content-Type` header value for this form.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode every part followed by the closing delimiter.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        for part in &self.parts {
            part.write_to(&self.boundary, &mut buf);
        }
        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");
        buf.freeze()
    }
}

fn generate_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();

    format!("----CourierBoundary{nanos:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_part_has_no_content_type() {
        let part = Part::text("title", "Groceries");
        assert_eq!(part.name(), "title");
        assert_eq!(part.content_type(), None);
        assert_eq!(part.data().as_ref(), b"Groceries");
    }

    #[test]
    fn file_part_content_type_from_extension() {
        assert_eq!(
            Part::file("f", "REPORT.PDF", "").content_type(),
            Some("application/pdf")
        );
        assert_eq!(
            Part::file("f", "notes", "").content_type(),
            Some(DEFAULT_PART_TYPE)
        );
        assert_eq!(
            Part::file("f", "a.bin", "")
                .with_content_type("application/x-custom")
                .content_type(),
            Some("application/x-custom")
        );
    }

    #[test]
    fn generated_boundary() {
        assert!(Form::new().boundary().starts_with("----CourierBoundary"));
    }

    #[test]
    fn encode_form() {
        let form = Form::with_boundary("xyz")
            .text("title", "Groceries")
            .part(Part::file("attachment", "list.csv", "milk,eggs"));

        let body = form.encode();

        insta::assert_snapshot!(String::from_utf8_lossy(&body).replace("\r\n", "\n"), @r#"
        --xyz
        Content-Disposition: form-data; name="title"

        Groceries
        --xyz
        Content-Disposition: form-data; name="attachment"; filename="list.csv"
        Content-Type: text/csv

        milk,eggs
        --xyz--
        "#);
    }

    #[test]
    fn quoted_names_are_escaped() {
        let form = Form::with_boundary("b").text("a\"b", "v");
        let body = form.encode();
        assert!(String::from_utf8_lossy(&body).contains("name=\"a%22b\""));
    }
}
