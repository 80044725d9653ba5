//! Core types and traits for the courier typed HTTP request pipeline.
//!
//! This crate provides the building blocks used by `courier`:
//! - [`Method`] - HTTP method enum (parsed case-insensitively)
//! - [`ResponseType`] and the [`kind`] markers - declared response decodings
//! - [`ApiRequest`] and [`RequestParts`] - declarative request descriptions
//! - [`Response`] and [`decode`] - transport responses and their decodings
//! - [`Error`] and [`Result`] - the pipeline error taxonomy
//! - [`Schema`] - validation/coercion seam with [`SchemaError::prettify`]
//! - [`Transport`] - the HTTP exchange seam
//! - [`Authorize`] - the pre-transport authorization hook
//! - [`build_url`], [`resolve_absolute_url`], [`merge_headers`] - request construction helpers

mod abort;
mod auth;
mod body;
mod error;
mod headers;
mod infer;
mod method;
mod multipart;
pub mod prelude;
pub mod query;
mod request;
mod response;
mod response_type;
mod schema;
mod transport;
mod url_builder;

pub use abort::{AbortController, AbortSignal};
pub use auth::{AuthFuture, Authorize, AuthorizeFn, authorize_fn};
pub use body::{Body, SerializedBody};
pub use error::{AuthError, Error, Result, ValidationTarget};
pub use headers::merge_headers;
pub use infer::{InferApiResponse, NoSchema, OutputSchema, ResolveKind};
pub use method::{Method, UnknownMethod};
pub use multipart::{Form, Part};
pub use query::{ArrayFormat, DateSerializer, QueryOptions};
pub use request::{ApiRequest, RequestParts};
pub use response::{Blob, DecodeError, Response, ResponseData, decode};
pub use response_type::{ResponseKind, ResponseType, UnknownResponseType, kind};
pub use schema::{FnSchema, Issue, Schema, SchemaError, Typed, ValueSchema, schema_fn, typed};
pub use transport::{Credentials, Exchange, ExchangeBuilder, RequestMode, Transport, TransportError};
pub use url_builder::{build_url, resolve_absolute_url};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
