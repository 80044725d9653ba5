//! Request bodies and their wire serialization.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::{Blob, Form};

const TEXT_PLAIN: &str = "text/plain;charset=UTF-8";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// A request body.
///
/// Structured values are what body schemas validate. The other variants are
/// opaque payloads sent as they are.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Structured data, sent as text.
    Value(Value),
    /// Raw bytes.
    Bytes(Bytes),
    /// Binary object with its own content type.
    Blob(Blob),
    /// Multipart form.
    Form(Form),
    /// URL-encoded parameters.
    Params(Vec<(String, String)>),
}

/// A body ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedBody {
    /// Content type implied by the payload, if any.
    pub content_type: Option<String>,
    /// Encoded payload.
    pub bytes: Bytes,
}

impl Body {
    /// URL-encoded parameters from key/value pairs.
    pub fn params<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Params(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// URL-encoded parameters from a serializable struct or map.
    pub fn form_urlencoded<T: Serialize>(value: &T) -> Result<Self, serde_urlencoded::ser::Error> {
        let encoded = serde_urlencoded::to_string(value)?;
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(&encoded)
            .map_err(|err| serde_urlencoded::ser::Error::Custom(err.to_string().into()))?;
        Ok(Self::Params(pairs))
    }

    /// Structured value, if any.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Encode for the transport.
    ///
    /// Strings, numbers and booleans are sent in their plain text form, other
    /// values as JSON text. Opaque payloads keep their bytes.
    #[must_use]
    pub fn serialize(self) -> SerializedBody {
        match self {
            Self::Value(value) => {
                let text = match value {
                    Value::String(text) => text,
                    Value::Number(number) => number.to_string(),
                    Value::Bool(flag) => flag.to_string(),
                    other => other.to_string(),
                };
                SerializedBody {
                    content_type: Some(TEXT_PLAIN.to_string()),
                    bytes: Bytes::from(text),
                }
            }
            Self::Bytes(bytes) => SerializedBody {
                content_type: None,
                bytes,
            },
            Self::Blob(blob) => SerializedBody {
                content_type: Some(blob.content_type().to_string()).filter(|ct| !ct.is_empty()),
                bytes: blob.into_data(),
            },
            Self::Form(form) => SerializedBody {
                content_type: Some(form.content_type()),
                bytes: form.encode(),
            },
            Self::Params(pairs) => {
                let encoded = serde_urlencoded::to_string(&pairs).unwrap_or_default();
                SerializedBody {
                    content_type: Some(FORM_URLENCODED.to_string()),
                    bytes: Bytes::from(encoded),
                }
            }
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Value(Value::String(text))
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Value(Value::String(text.to_string()))
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<Blob> for Body {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<Form> for Body {
    fn from(form: Form) -> Self {
        Self::Form(form)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn primitives_are_sent_as_plain_text() {
        for (body, expected) in [
            (Body::from("hello"), "hello"),
            (Body::from(json!(42)), "42"),
            (Body::from(json!(1.5)), "1.5"),
            (Body::from(json!(true)), "true"),
        ] {
            let serialized = body.serialize();
            assert_eq!(serialized.bytes.as_ref(), expected.as_bytes());
            assert_eq!(serialized.content_type.as_deref(), Some(TEXT_PLAIN));
        }
    }

    #[test]
    fn objects_are_sent_as_json_text() {
        let serialized = Body::from(json!({"title": "Write docs", "done": false})).serialize();
        assert_eq!(
            serialized.bytes.as_ref(),
            br#"{"title":"Write docs","done":false}"#
        );
    }

    #[test]
    fn opaque_payloads_pass_through() {
        let serialized = Body::from(vec![0_u8, 159, 146, 150]).serialize();
        assert_eq!(serialized.bytes.as_ref(), &[0, 159, 146, 150]);
        assert_eq!(serialized.content_type, None);

        let serialized = Body::from(Blob::new("image/png", "png")).serialize();
        assert_eq!(serialized.content_type.as_deref(), Some("image/png"));

        let serialized = Body::from(Blob::new("", "?")).serialize();
        assert_eq!(serialized.content_type, None);

        let serialized = Body::from(Form::with_boundary("b").text("k", "v")).serialize();
        assert_eq!(
            serialized.content_type.as_deref(),
            Some("multipart/form-data; boundary=b")
        );
    }

    #[test]
    fn params_are_url_encoded() {
        let serialized = Body::params([("q", "a b"), ("lang", "fr&en")]).serialize();
        assert_eq!(serialized.bytes.as_ref(), b"q=a+b&lang=fr%26en");
        assert_eq!(serialized.content_type.as_deref(), Some(FORM_URLENCODED));
    }

    #[test]
    fn form_urlencoded_from_struct() {
        #[derive(Serialize)]
        struct Login<'a> {
            username: &'a str,
            password: &'a str,
        }

        let body = Body::form_urlencoded(&Login {
            username: "alice",
            password: "s3cr=t",
        })
        .expect("encodable");

        assert_eq!(
            body,
            Body::params([("username", "alice"), ("password", "s3cr=t")])
        );
    }
}
