//! HTTP transport seam.
//!
//! - [`Transport`] - performs one HTTP exchange
//! - [`Exchange`] and [`ExchangeBuilder`] - everything the transport needs to send
//! - [`TransportError`] - why an exchange could not produce a response

use std::collections::HashMap;
use std::future::Future;

use bytes::Bytes;
use derive_more::{Display, Error};

use crate::{AbortSignal, Method, Response};

/// Known messages of failures where the host could not be reached.
const NETWORK_FAILURE_SIGNATURES: &[&str] = &[
    "failed to fetch",
    "connection refused",
    "connection reset",
    "network is unreachable",
    "no route to host",
    "dns error",
    "could not resolve host",
];

/// Request mode hint, forwarded to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum RequestMode {
    /// Cross-origin requests allowed.
    #[default]
    #[display("cors")]
    Cors,
    /// Opaque cross-origin requests.
    #[display("no-cors")]
    NoCors,
    /// Same-origin requests only.
    #[display("same-origin")]
    SameOrigin,
    /// Navigation request.
    #[display("navigate")]
    Navigate,
}

/// Credentials policy, forwarded to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum Credentials {
    /// Never send credentials.
    #[display("omit")]
    Omit,
    /// Send credentials to same-origin URLs only.
    #[display("same-origin")]
    SameOrigin,
    /// Always send credentials.
    #[default]
    #[display("include")]
    Include,
}

/// Why a transport could not produce a response.
#[derive(Debug, Display, Error)]
pub enum TransportError {
    /// The connection to the host could not be established.
    #[display("connection failed: {_0}")]
    Connect(#[error(not(source))] String),

    /// TLS handshake or certificate failure.
    #[display("TLS error: {_0}")]
    Tls(#[error(not(source))] String),

    /// The exchange was aborted through its [`AbortSignal`].
    #[display("request aborted")]
    Aborted,

    /// The request could not be built (bad URL, bad header...).
    #[display("invalid request: {_0}")]
    InvalidRequest(#[error(not(source))] String),

    /// The redirect chain exceeded the transport limit.
    #[display("too many redirects (limit {max})")]
    TooManyRedirects {
        /// Limit that was reached.
        max: usize,
    },

    /// Any other failure.
    #[display("{_0}")]
    Other(#[error(not(source))] String),
}

impl TransportError {
    /// Create a connection failure.
    #[must_use]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect(message.into())
    }

    /// Create a TLS failure.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request failure.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an unclassified failure.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Returns `true` if this is an abort.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Returns `true` if the host could not be reached.
    ///
    /// Connect failures always qualify; other failures qualify when their
    /// message matches a known network-unreachable signature.
    #[must_use]
    pub fn is_network_failure(&self) -> bool {
        match self {
            Self::Connect(_) => true,
            Self::Aborted | Self::TooManyRedirects { .. } => false,
            Self::Tls(message) | Self::InvalidRequest(message) | Self::Other(message) => {
                let message = message.to_lowercase();
                NETWORK_FAILURE_SIGNATURES
                    .iter()
                    .any(|signature| message.contains(signature))
            }
        }
    }
}

/// Everything a [`Transport`] needs to perform one exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    mode: RequestMode,
    credentials: Credentials,
    signal: Option<AbortSignal>,
}

impl Exchange {
    /// Creates a new [`ExchangeBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: impl Into<String>) -> ExchangeBuilder {
        ExchangeBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Absolute request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Serialized request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Request mode.
    #[must_use]
    pub const fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Credentials policy.
    #[must_use]
    pub const fn credentials(&self) -> Credentials {
        self.credentials
    }

    /// Abort signal, if any.
    #[must_use]
    pub const fn signal(&self) -> Option<&AbortSignal> {
        self.signal.as_ref()
    }

    /// Take the abort signal out of the exchange.
    pub fn take_signal(&mut self) -> Option<AbortSignal> {
        self.signal.take()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, String, HashMap<String, String>, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for constructing [`Exchange`] instances.
#[derive(Debug, Clone)]
pub struct ExchangeBuilder {
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    mode: RequestMode,
    credentials: Credentials,
    signal: Option<AbortSignal>,
}

impl ExchangeBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            mode: RequestMode::default(),
            credentials: Credentials::default(),
            signal: None,
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request mode.
    #[must_use]
    pub const fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the credentials policy.
    #[must_use]
    pub const fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the abort signal.
    #[must_use]
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Builds the [`Exchange`].
    #[must_use]
    pub fn build(self) -> Exchange {
        Exchange {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            mode: self.mode,
            credentials: self.credentials,
            signal: self.signal,
        }
    }
}

/// Core transport trait.
///
/// Performs one HTTP exchange. A non-success status is a successful exchange;
/// only failures to obtain a response are errors. Implementations must honour
/// the exchange's [`AbortSignal`] by failing with [`TransportError::Aborted`].
pub trait Transport: Send + Sync {
    /// Send the exchange and return the response.
    fn exchange(
        &self,
        exchange: Exchange,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}
