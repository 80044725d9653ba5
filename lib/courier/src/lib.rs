//! Typed HTTP request pipeline.
//!
//! Describe an endpoint call with an [`ApiRequest`], send it through an
//! [`ApiClient`], and get back either a value whose type is inferred from the
//! request and client configuration, or a classified [`Error`].
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Todo {
//!     id: u64,
//!     title: String,
//!     completed: bool,
//! }
//!
//! let client = courier::connect(
//!     ClientConfig::builder("https://jsonplaceholder.typicode.com")
//!         .response_type::<kind::Json>()
//!         .build(),
//! );
//!
//! // `Vec<Todo>`: json by client default, then the response schema
//! let todos = client
//!     .send(ApiRequest::get("/todos").query(json!({"userId": 1})).output(typed::<Vec<Todo>>()))
//!     .await?;
//!
//! // `String`: the request overrides the response kind
//! let html = client
//!     .send(ApiRequest::get("/").response_type::<kind::Text>())
//!     .await?;
//! ```
//!
//! # Pipeline
//!
//! 1. query validation (`query_schema`), failures carry the preview URL
//! 2. authorization hook ([`Authorize`])
//! 3. final URL, body validation (`body_schema`)
//! 4. header merge, body serialization
//! 5. transport ([`Transport`], [`HyperTransport`] by default)
//! 6. decoding, HTTP status check, response validation (`output`)

mod auth;
mod client;
mod config;
mod connector;
pub mod middleware;
pub mod prelude;
mod transport;

pub use auth::BearerAuth;
#[cfg(feature = "basic-auth")]
pub use auth::BasicAuth;
pub use client::{ApiClient, connect, create_client};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use transport::{BoxedService, ExchangeFuture, HyperTransport, HyperTransportBuilder};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use courier_core::{
    AbortController, AbortSignal, ApiRequest, AuthError, AuthFuture, Authorize, AuthorizeFn,
    Blob, Body, Credentials, DecodeError, Error, Exchange, ExchangeBuilder, FnSchema, Form,
    InferApiResponse, Issue, Method, NoSchema, OutputSchema, Part, RequestMode, RequestParts,
    ResolveKind, Response, ResponseData, ResponseKind, ResponseType, Result, Schema, SchemaError,
    SerializedBody, Transport, TransportError, Typed, UnknownMethod, UnknownResponseType,
    ValidationTarget, ValueSchema, authorize_fn, build_url, decode, kind, merge_headers, query,
    resolve_absolute_url, schema_fn, typed,
};

// Re-export http types for status codes and headers
pub use courier_core::{StatusCode, header};
