//! Prelude module for convenient imports.
//!
//! ```
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    AbortController, AbortSignal, ApiRequest, AuthError, Authorize, Blob, Body, Credentials,
    Error, Form, Issue, Method, NoSchema, Part, RequestMode, RequestParts, Response, Result,
    Schema, SchemaError, Transport, ValidationTarget, authorize_fn, kind, schema_fn, typed,
};
