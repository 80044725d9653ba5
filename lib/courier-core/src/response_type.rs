//! Declared response decodings.
//!
//! [`ResponseType`] is the runtime name of a decoding. The [`kind`] markers
//! carry the same information at the type level so that the result type of a
//! call can be inferred from static configuration.

use std::str::FromStr;

use bytes::Bytes;
use derive_more::{Display, Error};

use crate::response::{Blob, DecodeError, ResponseData};

/// Decoding strategy applied to a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum ResponseType {
    /// No decoding: the transport response itself is the result.
    #[default]
    #[display("raw")]
    Raw,
    /// UTF-8 text.
    #[display("text")]
    Text,
    /// Parsed JSON document.
    #[display("json")]
    Json,
    /// Binary object with its content type.
    #[display("blob")]
    Blob,
    /// Raw byte buffer.
    #[display("arraybuffer")]
    ArrayBuffer,
}

/// Error returned when parsing an unrecognized response type name.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("unsupported response type: {_0}")]
pub struct UnknownResponseType(#[error(not(source))] String);

impl FromStr for ResponseType {
    type Err = UnknownResponseType;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "raw" => Ok(Self::Raw),
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "blob" => Ok(Self::Blob),
            "arraybuffer" => Ok(Self::ArrayBuffer),
            _ => Err(UnknownResponseType(name.to_string())),
        }
    }
}

/// Type-level response kinds.
///
/// Use them with `ClientConfigBuilder::response_type` and
/// [`ApiRequest::response_type`](crate::ApiRequest::response_type).
pub mod kind {
    /// The transport response is returned untouched.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Raw;

    /// The body is decoded as text.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Text;

    /// The body is decoded as JSON.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Json;

    /// The body is decoded as a [`Blob`](crate::Blob).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Blob;

    /// The body is decoded as raw bytes.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ArrayBuffer;

    /// No request-level override: the client default applies.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Inherit;
}

/// A concrete response decoding known at compile time.
pub trait ResponseKind: Send + Sync + 'static {
    /// Runtime name of this decoding.
    const RESPONSE_TYPE: ResponseType;

    /// Value produced by this decoding.
    type Decoded: Send + 'static;

    /// Extract the typed value from the output of [`decode`](crate::decode).
    fn extract(data: Option<ResponseData>) -> Result<Self::Decoded, DecodeError>;
}

const fn mismatch(expected: ResponseType) -> DecodeError {
    DecodeError::Mismatch { expected }
}

impl ResponseKind for kind::Raw {
    const RESPONSE_TYPE: ResponseType = ResponseType::Raw;
    type Decoded = ();

    fn extract(_data: Option<ResponseData>) -> Result<Self::Decoded, DecodeError> {
        Ok(())
    }
}

impl ResponseKind for kind::Text {
    const RESPONSE_TYPE: ResponseType = ResponseType::Text;
    type Decoded = String;

    fn extract(data: Option<ResponseData>) -> Result<Self::Decoded, DecodeError> {
        match data {
            Some(ResponseData::Text(text)) => Ok(text),
            _ => Err(mismatch(Self::RESPONSE_TYPE)),
        }
    }
}

impl ResponseKind for kind::Json {
    const RESPONSE_TYPE: ResponseType = ResponseType::Json;
    type Decoded = serde_json::Value;

    fn extract(data: Option<ResponseData>) -> Result<Self::Decoded, DecodeError> {
        match data {
            Some(ResponseData::Json(value)) => Ok(value),
            _ => Err(mismatch(Self::RESPONSE_TYPE)),
        }
    }
}

impl ResponseKind for kind::Blob {
    const RESPONSE_TYPE: ResponseType = ResponseType::Blob;
    type Decoded = Blob;

    fn extract(data: Option<ResponseData>) -> Result<Self::Decoded, DecodeError> {
        match data {
            Some(ResponseData::Blob(blob)) => Ok(blob),
            _ => Err(mismatch(Self::RESPONSE_TYPE)),
        }
    }
}

impl ResponseKind for kind::ArrayBuffer {
    const RESPONSE_TYPE: ResponseType = ResponseType::ArrayBuffer;
    type Decoded = Bytes;

    fn extract(data: Option<ResponseData>) -> Result<Self::Decoded, DecodeError> {
        match data {
            Some(ResponseData::ArrayBuffer(bytes)) => Ok(bytes),
            _ => Err(mismatch(Self::RESPONSE_TYPE)),
        }
    }
}
