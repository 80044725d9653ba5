//! Query-string encoding.
//!
//! [`stringify`] turns a structured JSON value into a query string using the
//! bracket conventions common to web backends:
//!
//! | value                     | encoding                         |
//! |---------------------------|----------------------------------|
//! | `{"a": {"b": 1}}`         | `a%5Bb%5D=1`                     |
//! | `{"a": [1, 2]}` brackets  | `a%5B%5D=1&a%5B%5D=2`            |
//! | `{"a": [1, 2]}` indices   | `a%5B0%5D=1&a%5B1%5D=2`          |
//! | `{"a": [1, 2]}` repeat    | `a=1&a=2`                        |
//! | `{"a": [1, 2]}` comma     | `a=1%2C2`                        |
//! | `{"a": null}`             | `a=`                             |
//!
//! Empty arrays and objects produce nothing. Keys and values are
//! percent-encoded, leaving only unreserved characters as-is.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use derive_more::{Display, Error};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

/// Everything but unreserved characters (RFC 3986).
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// How arrays are laid out in the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum ArrayFormat {
    /// `a[0]=x&a[1]=y`
    #[display("indices")]
    Indices,
    /// `a[]=x&a[]=y`
    #[default]
    #[display("brackets")]
    Brackets,
    /// `a=x&a=y`
    #[display("repeat")]
    Repeat,
    /// `a=x,y`
    #[display("comma")]
    Comma,
}

/// Error returned when parsing an unrecognized array format name.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("unsupported array format: {_0}")]
pub struct UnknownArrayFormat(#[error(not(source))] String);

impl FromStr for ArrayFormat {
    type Err = UnknownArrayFormat;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "indices" => Ok(Self::Indices),
            "brackets" => Ok(Self::Brackets),
            "repeat" => Ok(Self::Repeat),
            "comma" => Ok(Self::Comma),
            _ => Err(UnknownArrayFormat(name.to_string())),
        }
    }
}

/// Renders a date found in query values.
pub type DateSerializer = Arc<dyn Fn(&DateTime<Utc>) -> String + Send + Sync>;

/// ISO-8601 with millisecond precision, `Z` suffixed.
#[must_use]
pub fn iso_date_serializer() -> DateSerializer {
    Arc::new(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Options for [`stringify`].
#[derive(Clone, Default)]
pub struct QueryOptions {
    array_format: ArrayFormat,
    serialize_date: Option<DateSerializer>,
}

impl fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("array_format", &self.array_format)
            .field("serialize_date", &self.serialize_date.is_some())
            .finish()
    }
}

impl QueryOptions {
    /// Options with the given array layout and no date serializer.
    #[must_use]
    pub fn new(array_format: ArrayFormat) -> Self {
        Self {
            array_format,
            serialize_date: None,
        }
    }

    /// Set the date serializer.
    ///
    /// String leaves holding an RFC 3339 timestamp are then re-rendered with it.
    #[must_use]
    pub fn with_date_serializer(mut self, serializer: DateSerializer) -> Self {
        self.serialize_date = Some(serializer);
        self
    }

    /// Array layout.
    #[must_use]
    pub const fn array_format(&self) -> ArrayFormat {
        self.array_format
    }

    /// Date serializer, if configured.
    #[must_use]
    pub fn date_serializer(&self) -> Option<&DateSerializer> {
        self.serialize_date.as_ref()
    }

    fn render_scalar(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => match &self.serialize_date {
                Some(serialize) => DateTime::parse_from_rfc3339(s).map_or_else(
                    |_| s.clone(),
                    |date| serialize(&date.with_timezone(&Utc)),
                ),
                None => s.clone(),
            },
            other => other.to_string(),
        }
    }
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_ENCODE_SET).to_string()
}

/// Encode `value` as a query string, without the leading `?`.
///
/// Only objects and arrays produce output; a scalar at the top level yields an
/// empty string.
#[must_use]
pub fn stringify(value: &Value, options: &QueryOptions) -> String {
    let mut pairs = Vec::new();
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                push_pairs(key.clone(), value, options, &mut pairs);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                push_pairs(index.to_string(), value, options, &mut pairs);
            }
        }
        _ => {}
    }
    pairs.join("&")
}

fn push_pairs(prefix: String, value: &Value, options: &QueryOptions, pairs: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                push_pairs(format!("{prefix}[{key}]"), value, options, pairs);
            }
        }
        Value::Array(items) if options.array_format == ArrayFormat::Comma => {
            if items.is_empty() {
                return;
            }
            let joined = items
                .iter()
                .map(|item| options.render_scalar(item))
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(format!("{}={}", encode(&prefix), encode(&joined)));
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let key = match options.array_format {
                    ArrayFormat::Indices => format!("{prefix}[{index}]"),
                    ArrayFormat::Brackets => format!("{prefix}[]"),
                    ArrayFormat::Repeat | ArrayFormat::Comma => prefix.clone(),
                };
                push_pairs(key, item, options, pairs);
            }
        }
        scalar => {
            pairs.push(format!(
                "{}={}",
                encode(&prefix),
                encode(&options.render_scalar(scalar))
            ));
        }
    }
}
