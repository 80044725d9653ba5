//! Declarative request descriptions.
//!
//! An [`ApiRequest`] describes one endpoint call. Its two type parameters drive
//! result inference: `K` is the response kind (defaults to the client's) and
//! `S` the response schema (defaults to none).
//!
//! ```
//! use courier_core::{ApiRequest, kind, typed};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct Todo {
//!     id: u64,
//!     title: String,
//! }
//!
//! let request = ApiRequest::get("/todos")
//!     .query(json!({"page": 1}))
//!     .header("Accept", "application/json")
//!     .response_type::<kind::Json>()
//!     .output(typed::<Vec<Todo>>());
//!
//! assert_eq!(request.parts().path, "/todos");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::response_type::kind;
use crate::{AbortSignal, Body, Credentials, Method, NoSchema, RequestMode, ValueSchema};

/// The mutable part of a request, as seen by the pipeline and the
/// authorization hook.
#[derive(Clone)]
pub struct RequestParts {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the client base URL. May already carry a query.
    pub path: String,
    /// Structured query value.
    pub query: Option<Value>,
    /// Request body.
    pub body: Option<Body>,
    /// Request headers, merged over the client defaults.
    pub headers: HashMap<String, String>,
    /// Mode override.
    pub mode: Option<RequestMode>,
    /// Credentials override.
    pub credentials: Option<Credentials>,
    /// Cancellation signal.
    pub signal: Option<AbortSignal>,
    /// Schema validating (and coercing) the query.
    pub query_schema: Option<Arc<dyn ValueSchema>>,
    /// Schema validating (and coercing) a structured body.
    pub body_schema: Option<Arc<dyn ValueSchema>>,
}

impl fmt::Debug for RequestParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestParts")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("mode", &self.mode)
            .field("credentials", &self.credentials)
            .field("signal", &self.signal.is_some())
            .field("query_schema", &self.query_schema.is_some())
            .field("body_schema", &self.body_schema.is_some())
            .finish()
    }
}

impl RequestParts {
    /// Bare request parts.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            body: None,
            headers: HashMap::new(),
            mode: None,
            credentials: None,
            signal: None,
            query_schema: None,
            body_schema: None,
        }
    }
}

/// Description of one endpoint call.
pub struct ApiRequest<K = kind::Inherit, S = NoSchema> {
    parts: RequestParts,
    output: S,
    kind: PhantomData<fn() -> K>,
}

impl<K, S: fmt::Debug> fmt::Debug for ApiRequest<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("parts", &self.parts)
            .field("kind", &std::any::type_name::<K>())
            .field("output", &self.output)
            .finish()
    }
}

impl<K, S: Clone> Clone for ApiRequest<K, S> {
    fn clone(&self) -> Self {
        Self {
            parts: self.parts.clone(),
            output: self.output.clone(),
            kind: PhantomData,
        }
    }
}

impl ApiRequest {
    /// Request with the client's response kind and no response schema.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            parts: RequestParts::new(method, path),
            output: NoSchema,
            kind: PhantomData,
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// `PUT` request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// `HEAD` request.
    #[must_use]
    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::Head, path)
    }

    /// `OPTIONS` request.
    #[must_use]
    pub fn options(path: impl Into<String>) -> Self {
        Self::new(Method::Options, path)
    }
}

impl<K, S> ApiRequest<K, S> {
    /// Set a header. The name is lower-cased, so a later call wins over an
    /// earlier one whatever their casing.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.parts
            .headers
            .insert(name.as_ref().to_lowercase(), value.into());
        self
    }

    /// Set several headers, in order, as [`ApiRequest::header`] does.
    #[must_use]
    pub fn headers<N, V>(mut self, headers: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: AsRef<str>,
        V: Into<String>,
    {
        self.parts.headers.extend(
            headers
                .into_iter()
                .map(|(name, value)| (name.as_ref().to_lowercase(), value.into())),
        );
        self
    }

    /// Set the structured query.
    #[must_use]
    pub fn query(mut self, query: impl Into<Value>) -> Self {
        self.parts.query = Some(query.into());
        self
    }

    /// Set the query from a serializable value.
    pub fn query_params<T: Serialize>(mut self, query: &T) -> serde_json::Result<Self> {
        self.parts.query = Some(serde_json::to_value(query)?);
        Ok(self)
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.parts.body = Some(body.into());
        self
    }

    /// Set a structured body from a serializable value.
    pub fn json<T: Serialize>(mut self, body: &T) -> serde_json::Result<Self> {
        self.parts.body = Some(Body::Value(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Override the client request mode.
    #[must_use]
    pub const fn mode(mut self, mode: RequestMode) -> Self {
        self.parts.mode = Some(mode);
        self
    }

    /// Override the client credentials policy.
    #[must_use]
    pub const fn credentials(mut self, credentials: Credentials) -> Self {
        self.parts.credentials = Some(credentials);
        self
    }

    /// Attach a cancellation signal.
    #[must_use]
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.parts.signal = Some(signal);
        self
    }

    /// Validate the query with `schema` before anything else runs.
    ///
    /// An absent query is presented as `null`; a `null` result leaves it absent.
    #[must_use]
    pub fn query_schema(mut self, schema: impl ValueSchema + 'static) -> Self {
        self.parts.query_schema = Some(Arc::new(schema));
        self
    }

    /// Validate a structured body with `schema` after authorization.
    ///
    /// An absent body is presented as `null`; opaque payloads are not validated.
    #[must_use]
    pub fn body_schema(mut self, schema: impl ValueSchema + 'static) -> Self {
        self.parts.body_schema = Some(Arc::new(schema));
        self
    }

    /// Override the response kind.
    #[must_use]
    pub fn response_type<K2>(self) -> ApiRequest<K2, S> {
        ApiRequest {
            parts: self.parts,
            output: self.output,
            kind: PhantomData,
        }
    }

    /// Validate the decoded response with `schema`.
    #[must_use]
    pub fn output<S2>(self, schema: S2) -> ApiRequest<K, S2> {
        ApiRequest {
            parts: self.parts,
            output: schema,
            kind: PhantomData,
        }
    }

    /// Request parts.
    #[must_use]
    pub const fn parts(&self) -> &RequestParts {
        &self.parts
    }

    /// Mutable request parts.
    pub fn parts_mut(&mut self) -> &mut RequestParts {
        &mut self.parts
    }

    /// Response schema.
    #[must_use]
    pub const fn output_schema(&self) -> &S {
        &self.output
    }

    /// Consume into the parts and the response schema.
    #[must_use]
    pub fn into_parts(self) -> (RequestParts, S) {
        (self.parts, self.output)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{AbortController, typed};

    #[test]
    fn builder_sets_parts() {
        let controller = AbortController::new();
        let request = ApiRequest::post("/todos?draft=1")
            .header("X-Trace", "abc")
            .headers([("Accept", "application/json")])
            .query(json!({"notify": true}))
            .body(json!({"title": "Write docs"}))
            .mode(RequestMode::SameOrigin)
            .credentials(Credentials::Omit)
            .signal(controller.signal());

        let parts = request.parts();
        assert_eq!(parts.method, Method::Post);
        assert_eq!(parts.path, "/todos?draft=1");
        assert_eq!(parts.headers.len(), 2);
        assert_eq!(parts.query, Some(json!({"notify": true})));
        assert_eq!(parts.body, Some(Body::Value(json!({"title": "Write docs"}))));
        assert_eq!(parts.mode, Some(RequestMode::SameOrigin));
        assert_eq!(parts.credentials, Some(Credentials::Omit));
        assert!(parts.signal.is_some());
    }

    #[test]
    fn serializable_query_and_body() {
        #[derive(Serialize)]
        struct Filter {
            status: &'static str,
            tags: Vec<&'static str>,
        }

        let request = ApiRequest::get("/todos")
            .query_params(&Filter {
                status: "open",
                tags: vec!["home"],
            })
            .expect("serializable")
            .json(&json!([1, 2]))
            .expect("serializable");

        assert_eq!(
            request.parts().query,
            Some(json!({"status": "open", "tags": ["home"]}))
        );
        assert_eq!(request.parts().body, Some(Body::Value(json!([1, 2]))));
    }

    #[test]
    fn schemas_are_attached() {
        let request = ApiRequest::get("/todos")
            .query_schema(typed::<HashMap<String, u32>>())
            .body_schema(typed::<Value>());

        assert!(request.parts().query_schema.is_some());
        assert!(request.parts().body_schema.is_some());
        assert!(format!("{request:?}").contains("query_schema: true"));
    }

    #[test]
    fn type_changing_setters_keep_parts() {
        let request = ApiRequest::delete("/todos/1")
            .header("If-Match", "v1")
            .response_type::<kind::Text>()
            .output(typed::<String>());

        let (parts, _schema) = request.into_parts();
        assert_eq!(parts.method, Method::Delete);
        assert_eq!(parts.headers.get("if-match").map(String::as_str), Some("v1"));
    }

    #[test]
    fn later_header_wins_over_other_casing() {
        let request = ApiRequest::get("/me")
            .header("Authorization", "a")
            .header("authorization", "b")
            .headers([("X-Trace", "1"), ("x-trace", "2")]);

        let (parts, _schema) = request.into_parts();
        assert_eq!(
            parts.headers,
            HashMap::from([
                ("authorization".to_string(), "b".to_string()),
                ("x-trace".to_string(), "2".to_string()),
            ])
        );
    }
}
