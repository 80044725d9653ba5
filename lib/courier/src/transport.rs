//! [`Transport`] implementation using hyper-util.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use courier_core::{Exchange, Response, Transport, TransportError};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;
use tracing::trace;

use crate::connector::https_connector;
use crate::middleware::{DEFAULT_MAX_REDIRECTS, FollowRedirectLayer, LoggingLayer};

/// Type-erased exchange service, the unit middleware is composed on.
pub type BoxedService = BoxCloneService<Exchange, Response, TransportError>;

/// Future type for the tower [`Service`] implementation.
pub type ExchangeFuture =
    Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send + 'static>>;

/// Makes the boxed service `Sync`, as [`Transport`] requires.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, exchange: Exchange) -> ExchangeFuture {
        // Clone out of the lock, never hold it across the call
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(exchange).await })
    }
}

// ============================================================================
// Raw transport
// ============================================================================

#[derive(Clone)]
struct RawHyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl RawHyperTransport {
    fn new(settings: &Settings) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(settings.pool_idle_timeout)
            .pool_max_idle_per_host(settings.pool_idle_per_host)
            .build(https_connector(settings.connect_timeout));

        Self { inner }
    }

    fn build_hyper_request(exchange: Exchange) -> Result<http::Request<Full<Bytes>>, TransportError> {
        let url = url::Url::parse(exchange.url())
            .map_err(|err| TransportError::invalid_request(format!("{}: {err}", exchange.url())))?;

        // fetch-only hints, nothing to enforce outside a browser
        trace!(mode = %exchange.mode(), credentials = %exchange.credentials(), "exchange policy");

        let (method, _, headers, body) = exchange.into_parts();
        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|err| TransportError::invalid_request(err.to_string()))
    }

    /// Repeated header names are folded into one comma separated value.
    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        let mut extracted = HashMap::<String, String>::new();
        for (name, value) in headers {
            let Ok(value) = value.to_str() else {
                continue;
            };
            extracted
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
        extracted
    }

    async fn send(&self, exchange: Exchange) -> Result<Response, TransportError> {
        let request = Self::build_hyper_request(exchange)?;

        let response = self
            .inner
            .request(request)
            .await
            .map_err(Self::map_hyper_error)?;

        let status = response.status();
        let headers = Self::extract_headers(response.headers());
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| TransportError::other(error_chain(&err)))?
            .to_bytes();

        Ok(Response::new(status.as_u16(), headers, body))
    }

    async fn execute(&self, mut exchange: Exchange) -> Result<Response, TransportError> {
        let Some(signal) = exchange.take_signal() else {
            return self.send(exchange).await;
        };
        if signal.is_aborted() {
            return Err(TransportError::Aborted);
        }

        tokio::select! {
            biased;
            () = signal.aborted() => Err(TransportError::Aborted),
            result = self.send(exchange) => result,
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> TransportError {
        let message = error_chain(&err);

        if err.is_connect() {
            return TransportError::connect(message);
        }

        let lowered = message.to_lowercase();
        if lowered.contains("ssl") || lowered.contains("tls") || lowered.contains("certificate") {
            return TransportError::tls(message);
        }

        TransportError::other(message)
    }
}

/// `outer: inner: root` rendering of an error and its sources.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl Service<Exchange> for RawHyperTransport {
    type Response = Response;
    type Error = TransportError;
    type Future = ExchangeFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), TransportError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, exchange: Exchange) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.execute(exchange).await })
    }
}

// ============================================================================
// Public transport
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Settings {
    connect_timeout: Option<Duration>,
    pool_idle_per_host: usize,
    pool_idle_timeout: Duration,
    /// `None` hands 3xx responses back untouched.
    max_redirects: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            max_redirects: Some(DEFAULT_MAX_REDIRECTS),
        }
    }
}

/// HTTP transport over hyper-util, with TLS and tower middleware.
///
/// Follows up to 10 redirects unless configured otherwise.
/// Honours the [`AbortSignal`](crate::AbortSignal) of each exchange. Request
/// mode and credentials policy are browser notions and only traced.
///
/// # Example
///
/// ```ignore
/// use courier::HyperTransport;
/// use std::time::Duration;
///
/// let transport = HyperTransport::builder()
///     .connect_timeout(Duration::from_secs(5))
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    service: SyncService,
    settings: Settings,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Transport with default settings and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    async fn exchange(&self, exchange: Exchange) -> Result<Response, TransportError> {
        self.service.call(exchange).await
    }
}

impl Service<Exchange> for HyperTransport {
    type Response = Response;
    type Error = TransportError;
    type Future = ExchangeFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), TransportError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, exchange: Exchange) -> Self::Future {
        self.service.call(exchange)
    }
}

/// Builder for [`HyperTransport`].
#[derive(Default)]
pub struct HyperTransportBuilder {
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    follow_redirects: Option<bool>,
    max_redirects: Option<usize>,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("connect_timeout", &self.connect_timeout)
            .field("pool_idle_per_host", &self.pool_idle_per_host)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("follow_redirects", &self.follow_redirects)
            .field("max_redirects", &self.max_redirects)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperTransportBuilder {
    /// Set the TCP connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Follow 3xx redirects (on by default).
    ///
    /// When off, redirect responses reach the client as they are.
    #[must_use]
    pub const fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }

    /// Set the maximum number of redirects followed for one exchange (10 by default).
    #[must_use]
    pub const fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Add a tower layer around the exchange service.
    ///
    /// The last layer added is the outermost one.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Exchange, Response = Response, Error = TransportError>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Exchange>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Log exchanges at info level.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log exchanges at debug level, with headers.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Build the transport.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        let defaults = Settings::default();
        let settings = Settings {
            connect_timeout: self.connect_timeout.or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            max_redirects: match self.follow_redirects {
                Some(false) => None,
                _ => self.max_redirects.or(defaults.max_redirects),
            },
        };

        let raw = RawHyperTransport::new(&settings);
        // User layers see each hop's final response, not the intermediate 3xx
        let mut service: BoxedService = match settings.max_redirects {
            Some(max) => {
                BoxCloneService::new(FollowRedirectLayer::with_max_redirects(max).layer(raw))
            }
            None => BoxCloneService::new(raw),
        };
        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        HyperTransport {
            service: SyncService::new(service),
            settings,
        }
    }
}
