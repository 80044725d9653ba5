//! The request pipeline.

use std::sync::Arc;

use courier_core::{
    ApiRequest, Body, Error, Exchange, InferApiResponse, OutputSchema, ResolveKind, ResponseKind,
    Result, SchemaError, Transport, ValidationTarget, ValueSchema, build_url, decode,
    merge_headers, resolve_absolute_url,
};
use serde_json::Value;
use tracing::{Instrument, debug, debug_span, warn};

use crate::ClientConfig;
use crate::transport::HyperTransport;

/// Typed API client.
///
/// Runs every [`ApiRequest`] through the pipeline: query validation,
/// authorization, body validation, header merge, body serialization, transport,
/// decoding and response validation.
///
/// # Example
///
/// ```ignore
/// use courier::prelude::*;
///
/// let client = courier::connect(
///     ClientConfig::builder("https://jsonplaceholder.typicode.com")
///         .response_type::<kind::Json>()
///         .build(),
/// );
///
/// let todo: serde_json::Value = client.send(ApiRequest::get("/todos/1")).await?;
/// ```
pub struct ApiClient<T, D = courier_core::kind::Raw> {
    transport: Arc<T>,
    config: Arc<ClientConfig<D>>,
}

impl<T, D> Clone for ApiClient<T, D> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T: std::fmt::Debug, D: ResponseKind> std::fmt::Debug for ApiClient<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("transport", &self.transport)
            .field("config", &self.config)
            .finish()
    }
}

/// Create a client over the given transport.
#[must_use]
pub fn create_client<T, D>(config: ClientConfig<D>, transport: T) -> ApiClient<T, D>
where
    T: Transport,
    D: ResponseKind,
{
    ApiClient::new(config, transport)
}

/// Create a client over a default [`HyperTransport`].
#[must_use]
pub fn connect<D: ResponseKind>(config: ClientConfig<D>) -> ApiClient<HyperTransport, D> {
    ApiClient::new(config, HyperTransport::new())
}

impl<T, D> ApiClient<T, D>
where
    T: Transport,
    D: ResponseKind,
{
    /// Create a client.
    #[must_use]
    pub fn new(config: ClientConfig<D>, transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
        }
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig<D> {
        &self.config
    }

    /// Underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request and return its inferred result.
    ///
    /// The response kind is the request's own, or the client default. With
    /// `raw` the transport response is returned untouched; otherwise the
    /// decoded body, passed through the response schema when one is set.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] when a query, body or response schema rejects
    ///   its value
    /// - [`Error::Authorization`] when the authorization hook fails
    /// - [`Error::Connection`] or [`Error::Unexpected`] when the transport fails
    /// - [`Error::Http`] on a non-success status; its `response_data` is the
    ///   body decoded per the response kind, before and without the response
    ///   schema
    /// - [`Error::UnexpectedResponseFormat`] when the body cannot be decoded
    pub async fn send<K, S>(&self, request: ApiRequest<K, S>) -> Result<InferApiResponse<D, K, S>>
    where
        K: ResolveKind<D>,
        S: OutputSchema<K::Kind>,
    {
        let span = debug_span!(
            "api_request",
            method = %request.parts().method,
            path = %request.parts().path,
            response_type = %<K::Kind as ResponseKind>::RESPONSE_TYPE,
        );
        self.execute(request).instrument(span).await
    }

    async fn execute<K, S>(&self, request: ApiRequest<K, S>) -> Result<InferApiResponse<D, K, S>>
    where
        K: ResolveKind<D>,
        S: OutputSchema<K::Kind>,
    {
        let response_type = <K::Kind as ResponseKind>::RESPONSE_TYPE;
        let (mut parts, output) = request.into_parts();

        if let Some(schema) = &parts.query_schema {
            let preview_url = self.resolve_url(&parts.path, parts.query.as_ref());
            parts.query = coerce(schema.as_ref(), parts.query.take()).map_err(|failure| {
                warn!(url = %preview_url, "query validation failed");
                Error::validation(parts.method, preview_url, ValidationTarget::Query, &failure)
            })?;
        }

        if let Some(hook) = self.config.authorization() {
            hook.authorize(&mut parts).await.map_err(|err| {
                warn!(error = %err, "authorization failed");
                Error::Authorization(err)
            })?;
            debug!("authorization applied");
        }

        let method = parts.method;
        let url = self.resolve_url(&parts.path, parts.query.as_ref());

        if let Some(schema) = &parts.body_schema {
            let validated = match parts.body.take() {
                None => coerce(schema.as_ref(), None),
                Some(Body::Value(value)) => coerce(schema.as_ref(), Some(value)),
                // opaque payloads are sent as-is
                opaque => {
                    parts.body = opaque;
                    Ok(None)
                }
            };
            let validated = validated.map_err(|failure| {
                warn!(%url, "request body validation failed");
                Error::validation(method, url.as_str(), ValidationTarget::Request, &failure)
            })?;
            if let Some(value) = validated {
                parts.body = Some(Body::Value(value));
            }
        }

        let mut headers = merge_headers(self.config.headers(), &parts.headers);
        let mut exchange = Exchange::builder(method, url.as_str())
            .mode(parts.mode.unwrap_or(self.config.mode()))
            .credentials(parts.credentials.unwrap_or(self.config.credentials()));
        if let Some(body) = parts.body.map(Body::serialize) {
            if let Some(content_type) = body.content_type {
                headers
                    .entry("content-type".to_string())
                    .or_insert(content_type);
            }
            exchange = exchange.body(body.bytes);
        }
        if let Some(signal) = parts.signal {
            exchange = exchange.signal(signal);
        }
        let exchange = exchange.headers(headers).build();

        let response = self.transport.exchange(exchange).await.map_err(|source| {
            warn!(%url, error = %source, "transport failed");
            Error::from_transport(method, url.as_str(), source)
        })?;
        debug!(status = response.status(), "response received");

        let decoded = decode(&response, response_type);
        if !response.ok() {
            warn!(status = response.status(), %url, "HTTP error");
            return Err(Error::Http {
                method,
                url,
                status_code: response.status(),
                status_text: response.status_text().to_string(),
                response_data: decoded.ok().flatten(),
            });
        }

        let data = decoded
            .and_then(<K::Kind as ResponseKind>::extract)
            .map_err(|source| {
                warn!(%url, expected = %response_type, error = %source, "response decoding failed");
                Error::UnexpectedResponseFormat {
                    method,
                    url: url.clone(),
                    expected: response_type,
                    source,
                }
            })?;

        output.finish(response, data).map_err(|failure| {
            warn!(%url, "response validation failed");
            Error::validation(method, url.as_str(), ValidationTarget::Response, &failure)
        })
    }

    fn resolve_url(&self, path: &str, query: Option<&Value>) -> String {
        let path = build_url(path, query, self.config.query_options());
        resolve_absolute_url(self.config.base_url(), &path)
    }
}

/// Run a query/body schema. An absent value is presented as `null`; a `null`
/// result leaves it absent.
fn coerce(
    schema: &dyn ValueSchema,
    value: Option<Value>,
) -> std::result::Result<Option<Value>, SchemaError> {
    let value = schema.coerce(value.unwrap_or(Value::Null))?;
    Ok(Some(value).filter(|value| !value.is_null()))
}
