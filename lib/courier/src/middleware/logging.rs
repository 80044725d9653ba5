//! Exchange logging middleware.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Exchange, Response, TransportError};

/// Layer that logs exchanges with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Detail of the exchange logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Headers, body size, mode and credentials, at debug level.
    Debug,
    /// Method, URL, status and elapsed time, at info level.
    #[default]
    Info,
}

impl LoggingLayer {
    /// Summary logging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Detailed logging at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service logging the exchanges it forwards.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Service<Exchange> for Logging<S>
where
    S: Service<Exchange, Response = Response, Error = TransportError> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), TransportError>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, exchange: Exchange) -> Self::Future {
        let method = exchange.method();
        let url = exchange.url().to_string();
        let level = self.level;

        let span = span!(Level::INFO, "http_exchange", %method, %url);

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();

                match level {
                    LogLevel::Debug => debug!(
                        headers = ?exchange.headers(),
                        body_len = exchange.body().map_or(0, bytes::Bytes::len),
                        mode = %exchange.mode(),
                        credentials = %exchange.credentials(),
                        "sending exchange"
                    ),
                    LogLevel::Info => info!("sending exchange"),
                }

                let result = inner.call(exchange).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if response.ok() => {
                        info!(status = response.status(), elapsed_ms, "exchange completed");
                    }
                    Ok(response) => {
                        warn!(status = response.status(), elapsed_ms, "exchange returned HTTP error");
                    }
                    Err(err) if err.is_aborted() => info!(elapsed_ms, "exchange aborted"),
                    Err(err) => warn!(error = %err, elapsed_ms, "exchange failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tower::{ServiceExt, service_fn};

    use super::*;
    use crate::Method;

    #[test]
    fn logging_layer_levels() {
        assert_eq!(LoggingLayer::new().level, LogLevel::Info);
        assert_eq!(LoggingLayer::debug().level, LogLevel::Debug);
    }

    #[tokio::test]
    async fn logging_forwards_exchange_and_response() {
        let inner = service_fn(|exchange: Exchange| async move {
            Ok::<_, TransportError>(Response::new(
                201,
                HashMap::new(),
                exchange.url().to_string(),
            ))
        });
        let service = LoggingLayer::debug().layer(inner);

        let exchange = Exchange::builder(Method::Post, "https://api.x.com/todos").build();
        let response = service.oneshot(exchange).await.expect("response");

        assert_eq!(response.status(), 201);
        assert_eq!(response.text().expect("text"), "https://api.x.com/todos");
    }

    #[tokio::test]
    async fn logging_forwards_errors() {
        let inner = service_fn(|_: Exchange| async { Err::<Response, _>(TransportError::Aborted) });
        let service = LoggingLayer::new().layer(inner);

        let exchange = Exchange::builder(Method::Get, "https://api.x.com").build();
        let err = service.oneshot(exchange).await.expect_err("aborted");

        assert!(err.is_aborted());
    }
}
