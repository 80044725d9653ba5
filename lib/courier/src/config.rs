//! Client configuration types.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use courier_core::query::{ArrayFormat, DateSerializer, QueryOptions};
use courier_core::{Authorize, Credentials, RequestMode, ResponseKind, ResponseType, kind};

/// Configuration shared by every call of an [`ApiClient`](crate::ApiClient).
///
/// `D` is the default response kind, used by requests that do not pick one.
///
/// # Example
///
/// ```
/// use courier::{ClientConfig, kind};
///
/// let config = ClientConfig::builder("https://jsonplaceholder.typicode.com")
///     .header("Accept", "application/json")
///     .response_type::<kind::Json>()
///     .build();
///
/// assert_eq!(config.response_type().to_string(), "json");
/// ```
pub struct ClientConfig<D = kind::Raw> {
    base_url: String,
    headers: HashMap<String, String>,
    mode: RequestMode,
    credentials: Credentials,
    query: QueryOptions,
    authorization: Option<Arc<dyn Authorize>>,
    response_type: PhantomData<fn() -> D>,
}

impl<D> Clone for ClientConfig<D> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            headers: self.headers.clone(),
            mode: self.mode,
            credentials: self.credentials,
            query: self.query.clone(),
            authorization: self.authorization.clone(),
            response_type: PhantomData,
        }
    }
}

impl<D: ResponseKind> fmt::Debug for ClientConfig<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("mode", &self.mode)
            .field("credentials", &self.credentials)
            .field("response_type", &D::RESPONSE_TYPE)
            .field("query", &self.query)
            .field("authorization", &self.authorization.is_some())
            .finish()
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }
}

impl<D: ResponseKind> ClientConfig<D> {
    /// Base URL every request path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Default headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Default request mode.
    #[must_use]
    pub const fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Default credentials policy.
    #[must_use]
    pub const fn credentials(&self) -> Credentials {
        self.credentials
    }

    /// Default response type.
    #[must_use]
    pub const fn response_type(&self) -> ResponseType {
        D::RESPONSE_TYPE
    }

    /// Query encoding options.
    #[must_use]
    pub const fn query_options(&self) -> &QueryOptions {
        &self.query
    }

    /// Authorization hook, if any.
    #[must_use]
    pub fn authorization(&self) -> Option<&dyn Authorize> {
        self.authorization.as_deref()
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder<D = kind::Raw> {
    base_url: String,
    headers: HashMap<String, String>,
    mode: Option<RequestMode>,
    credentials: Option<Credentials>,
    array_format: Option<ArrayFormat>,
    date_serializer: Option<DateSerializer>,
    authorization: Option<Arc<dyn Authorize>>,
    response_type: PhantomData<fn() -> D>,
}

impl<D> fmt::Debug for ClientConfigBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("mode", &self.mode)
            .field("credentials", &self.credentials)
            .field("array_format", &self.array_format)
            .field("date_serializer", &self.date_serializer.is_some())
            .field("authorization", &self.authorization.is_some())
            .finish()
    }
}

impl ClientConfigBuilder {
    /// Create a builder for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: HashMap::new(),
            mode: None,
            credentials: None,
            array_format: None,
            date_serializer: None,
            authorization: None,
            response_type: PhantomData,
        }
    }
}

impl<D> ClientConfigBuilder<D> {
    /// Add a default header. The name is lower-cased.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_lowercase(), value.into());
        self
    }

    /// Add several default headers, in order, as
    /// [`ClientConfigBuilder::header`] does.
    #[must_use]
    pub fn headers<N, V>(mut self, headers: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: AsRef<str>,
        V: Into<String>,
    {
        self.headers.extend(
            headers
                .into_iter()
                .map(|(name, value)| (name.as_ref().to_lowercase(), value.into())),
        );
        self
    }

    /// Set the default request mode (`cors` if unset).
    #[must_use]
    pub const fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the default credentials policy (`include` if unset).
    #[must_use]
    pub const fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the query array format (`brackets` if unset).
    #[must_use]
    pub const fn array_format(mut self, array_format: ArrayFormat) -> Self {
        self.array_format = Some(array_format);
        self
    }

    /// Set the serializer used for dates found in query values.
    #[must_use]
    pub fn date_serializer(mut self, serializer: DateSerializer) -> Self {
        self.date_serializer = Some(serializer);
        self
    }

    /// Set the authorization hook.
    #[must_use]
    pub fn authorization(mut self, hook: impl Authorize + 'static) -> Self {
        self.authorization = Some(Arc::new(hook));
        self
    }

    /// Set the default response kind (`raw` if unset).
    #[must_use]
    pub fn response_type<D2: ResponseKind>(self) -> ClientConfigBuilder<D2> {
        ClientConfigBuilder {
            base_url: self.base_url,
            headers: self.headers,
            mode: self.mode,
            credentials: self.credentials,
            array_format: self.array_format,
            date_serializer: self.date_serializer,
            authorization: self.authorization,
            response_type: PhantomData,
        }
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig<D> {
        let mut query = QueryOptions::new(self.array_format.unwrap_or_default());
        if let Some(serializer) = self.date_serializer {
            query = query.with_date_serializer(serializer);
        }

        ClientConfig {
            base_url: self.base_url,
            headers: self.headers,
            mode: self.mode.unwrap_or_default(),
            credentials: self.credentials.unwrap_or_default(),
            query,
            authorization: self.authorization,
            response_type: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use courier_core::authorize_fn;

    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::builder("https://api.x.com").build();

        assert_eq!(config.base_url(), "https://api.x.com");
        assert!(config.headers().is_empty());
        assert_eq!(config.mode(), RequestMode::Cors);
        assert_eq!(config.credentials(), Credentials::Include);
        assert_eq!(config.response_type(), ResponseType::Raw);
        assert_eq!(config.query_options().array_format(), ArrayFormat::Brackets);
        assert!(config.query_options().date_serializer().is_none());
        assert!(config.authorization().is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder("https://api.x.com")
            .header("X-Env", "prod")
            .headers([("Accept", "application/json")])
            .mode(RequestMode::SameOrigin)
            .credentials(Credentials::Omit)
            .array_format(ArrayFormat::Comma)
            .date_serializer(courier_core::query::iso_date_serializer())
            .authorization(authorize_fn(|_| Ok(())))
            .response_type::<kind::Text>()
            .build();

        assert_eq!(config.headers().len(), 2);
        assert_eq!(config.mode(), RequestMode::SameOrigin);
        assert_eq!(config.credentials(), Credentials::Omit);
        assert_eq!(config.response_type(), ResponseType::Text);
        assert_eq!(config.query_options().array_format(), ArrayFormat::Comma);
        assert!(config.query_options().date_serializer().is_some());
        assert!(config.authorization().is_some());
    }

    #[test]
    fn header_names_are_lower_cased_on_insert() {
        let config = ClientConfig::builder("https://api.x.com")
            .header("Authorization", "a")
            .headers([("AUTHORIZATION", "b")])
            .build();

        assert_eq!(config.headers().len(), 1);
        assert_eq!(
            config.headers().get("authorization").map(String::as_str),
            Some("b")
        );
    }

    #[test]
    fn config_is_debug() {
        let config = ClientConfig::builder("https://api.x.com")
            .response_type::<kind::Json>()
            .build();
        let debug = format!("{config:?}");
        assert!(debug.contains("response_type: Json"));
        assert!(debug.contains("authorization: false"));
    }
}
