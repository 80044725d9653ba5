//! Type-level inference of the result of a call.
//!
//! The result type of [`ApiClient::send`] is computed from three pieces of
//! static configuration:
//!
//! 1. the response kind of the request, or the client default when the request
//!    says [`kind::Inherit`] ([`ResolveKind`]);
//! 2. whether the resolved kind is [`kind::Raw`], in which case the transport
//!    [`Response`] itself is the result;
//! 3. otherwise the output of the response schema, or the decoded value of the
//!    kind when the request carries [`NoSchema`] ([`OutputSchema`]).
//!
//! [`InferApiResponse`] names the result.
//!
//! [`ApiClient::send`]: https://docs.rs/courier/latest/courier/struct.ApiClient.html#method.send

use bytes::Bytes;
use serde_json::Value;

use crate::response_type::{ResponseKind, kind};
use crate::{Blob, Response, Schema, SchemaError};

/// Resolves the effective response kind against the client default `D`.
pub trait ResolveKind<D: ResponseKind> {
    /// Effective kind.
    type Kind: ResponseKind;
}

impl<D: ResponseKind> ResolveKind<D> for kind::Inherit {
    type Kind = D;
}

impl<D: ResponseKind> ResolveKind<D> for kind::Raw {
    type Kind = Self;
}

impl<D: ResponseKind> ResolveKind<D> for kind::Text {
    type Kind = Self;
}

impl<D: ResponseKind> ResolveKind<D> for kind::Json {
    type Kind = Self;
}

impl<D: ResponseKind> ResolveKind<D> for kind::Blob {
    type Kind = Self;
}

impl<D: ResponseKind> ResolveKind<D> for kind::ArrayBuffer {
    type Kind = Self;
}

/// Marker for requests without a response schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoSchema;

/// Turns the decoded body of kind `K` into the result of a call.
pub trait OutputSchema<K: ResponseKind>: Send + Sync {
    /// Result of the call.
    type Output;

    /// Produce the result from the response and its decoded body.
    fn finish(&self, response: Response, decoded: K::Decoded) -> Result<Self::Output, SchemaError>;
}

impl<S: Send + Sync> OutputSchema<kind::Raw> for S {
    type Output = Response;

    fn finish(&self, response: Response, (): ()) -> Result<Self::Output, SchemaError> {
        Ok(response)
    }
}

macro_rules! output_schema {
    ($kind:ty, $decoded:ty) => {
        impl<S: Schema<$decoded>> OutputSchema<$kind> for S {
            type Output = S::Output;

            fn finish(
                &self,
                _response: Response,
                decoded: $decoded,
            ) -> Result<Self::Output, SchemaError> {
                self.parse(decoded)
            }
        }
    };
}

output_schema!(kind::Text, String);
output_schema!(kind::Json, Value);
output_schema!(kind::Blob, Blob);
output_schema!(kind::ArrayBuffer, Bytes);

macro_rules! identity_schema {
    ($($decoded:ty),*) => {
        $(
            impl Schema<$decoded> for NoSchema {
                type Output = $decoded;

                fn parse(&self, input: $decoded) -> Result<Self::Output, SchemaError> {
                    Ok(input)
                }
            }
        )*
    };
}

identity_schema!(String, Value, Blob, Bytes);

/// Result type of a call with request kind `K` and response schema `S`
/// against a client whose default kind is `D`.
pub type InferApiResponse<D, K, S> =
    <S as OutputSchema<<K as ResolveKind<D>>::Kind>>::Output;

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::{Issue, schema_fn, typed};

    fn response() -> Response {
        Response::new(200, HashMap::new(), "")
    }

    fn finish<D, K, S>(
        schema: &S,
        decoded: <K::Kind as ResponseKind>::Decoded,
    ) -> InferApiResponse<D, K, S>
    where
        D: ResponseKind,
        K: ResolveKind<D>,
        S: OutputSchema<K::Kind>,
    {
        match schema.finish(response(), decoded) {
            Ok(output) => output,
            Err(err) => panic!("schema rejected: {err}"),
        }
    }

    #[test]
    fn inherit_resolves_to_client_default() {
        let text: String =
            finish::<kind::Text, kind::Inherit, NoSchema>(&NoSchema, "hi".to_string());
        assert_eq!(text, "hi");
    }

    #[test]
    fn request_kind_overrides_client_default() {
        let value: Value = finish::<kind::Text, kind::Json, NoSchema>(&NoSchema, json!({"a": 1}));
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn raw_returns_response_even_with_schema() {
        let raw: Response = finish::<kind::Json, kind::Raw, _>(&typed::<u32>(), ());
        assert_eq!(raw.status(), 200);
    }

    #[test]
    fn schema_output_replaces_decoded_value() {
        let len: usize = finish::<kind::Raw, kind::Text, _>(
            &schema_fn(|text: String| Ok::<_, SchemaError>(text.len())),
            "four".to_string(),
        );
        assert_eq!(len, 4);

        let id: u32 = finish::<kind::Json, kind::Inherit, _>(&typed::<u32>(), json!(7));
        assert_eq!(id, 7);
    }

    #[test]
    fn schema_failure_is_reported() {
        let schema = schema_fn(|_: String| Err::<(), _>(SchemaError::new(Issue::new("nope"))));
        let result = OutputSchema::<kind::Text>::finish(&schema, response(), String::new());
        assert!(result.is_err());
    }
}
