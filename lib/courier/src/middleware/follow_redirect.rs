//! Follow redirect middleware.
//!
//! Re-sends the exchange to the `Location` of 301, 302, 303, 307 and 308
//! responses, up to a maximum number of hops.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::{Layer, Service};
use tracing::debug;
use url::Url;

use crate::{Exchange, Method, Response, TransportError};

/// Default maximum number of redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Layer that follows HTTP redirects.
///
/// # Example
///
/// ```ignore
/// use courier::middleware::FollowRedirectLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(FollowRedirectLayer::with_max_redirects(3))
///     .service(raw);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FollowRedirectLayer {
    max_redirects: usize,
}

impl Default for FollowRedirectLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowRedirectLayer {
    /// Follow up to [`DEFAULT_MAX_REDIRECTS`] redirects.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    /// Follow up to `max_redirects` redirects.
    #[must_use]
    pub const fn with_max_redirects(max_redirects: usize) -> Self {
        Self { max_redirects }
    }
}

impl<S> Layer<S> for FollowRedirectLayer {
    type Service = FollowRedirect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FollowRedirect {
            inner,
            max_redirects: self.max_redirects,
        }
    }
}

/// Service that follows HTTP redirects.
#[derive(Debug, Clone)]
pub struct FollowRedirect<S> {
    inner: S,
    max_redirects: usize,
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Method of the follow-up exchange.
///
/// 303 switches to GET (HEAD stays HEAD), 301 and 302 switch a POST to GET,
/// everything else keeps its method.
fn redirect_method(status: u16, method: Method) -> Method {
    match (status, method) {
        (303, Method::Head) => Method::Head,
        (303, _) | (301 | 302, Method::Post) => Method::Get,
        _ => method,
    }
}

fn resolve_redirect_url(base: &str, location: &str) -> Result<Url, TransportError> {
    let base = Url::parse(base)
        .map_err(|err| TransportError::invalid_request(format!("{base}: {err}")))?;
    base.join(location).map_err(|err| {
        TransportError::invalid_request(format!("bad redirect location {location:?}: {err}"))
    })
}

fn same_origin(from: &str, to: &Url) -> bool {
    Url::parse(from).is_ok_and(|from| from.origin() == to.origin())
}

/// Build the exchange sent to `location` after a `status` redirect.
fn follow_up(
    exchange: &Exchange,
    status: u16,
    location: &str,
) -> Result<Exchange, TransportError> {
    let target = resolve_redirect_url(exchange.url(), location)?;
    let method = redirect_method(status, exchange.method());
    let drop_body = method != exchange.method();
    let cross_origin = !same_origin(exchange.url(), &target);

    let headers = exchange
        .headers()
        .iter()
        .filter(|(name, _)| !(drop_body && name.eq_ignore_ascii_case("content-type")))
        .filter(|(name, _)| !(cross_origin && name.eq_ignore_ascii_case("authorization")))
        .map(|(name, value)| (name.clone(), value.clone()));

    let mut builder = Exchange::builder(method, target.as_str())
        .headers(headers)
        .mode(exchange.mode())
        .credentials(exchange.credentials());
    if let Some(body) = exchange.body().filter(|_| !drop_body) {
        builder = builder.body(body.clone());
    }
    if let Some(signal) = exchange.signal() {
        builder = builder.signal(signal.clone());
    }
    Ok(builder.build())
}

impl<S> Service<Exchange> for FollowRedirect<S>
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
        let mut inner = self.inner.clone();
        let max_redirects = self.max_redirects;

        Box::pin(async move {
            let mut current = exchange;
            let mut redirects = 0;

            loop {
                let response = inner.call(current.clone()).await?;
                if !is_redirect(response.status()) {
                    return Ok(response);
                }
                // Without a location the redirect is handed back as is
                let Some(location) = response.header("location") else {
                    return Ok(response);
                };
                if redirects >= max_redirects {
                    return Err(TransportError::TooManyRedirects { max: max_redirects });
                }

                let next = follow_up(&current, response.status(), location)?;
                debug!(
                    status = response.status(),
                    from = current.url(),
                    to = next.url(),
                    method = %next.method(),
                    "following redirect"
                );
                current = next;
                redirects += 1;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use assert2::{check, let_assert};
    use tower::{ServiceExt, service_fn};

    use super::*;

    fn redirect(status: u16, location: &str) -> Response {
        Response::new(
            status,
            HashMap::from([("Location".to_string(), location.to_string())]),
            "",
        )
    }

    #[test]
    fn default_max_redirects() {
        check!(FollowRedirectLayer::new().max_redirects == DEFAULT_MAX_REDIRECTS);
        check!(FollowRedirectLayer::with_max_redirects(3).max_redirects == 3);
    }

    #[test]
    fn redirect_statuses() {
        for status in [301, 302, 303, 307, 308] {
            check!(is_redirect(status));
        }
        for status in [200, 300, 304, 404, 500] {
            check!(!is_redirect(status));
        }
    }

    #[test]
    fn redirect_method_rewrites() {
        check!(redirect_method(303, Method::Put) == Method::Get);
        check!(redirect_method(303, Method::Head) == Method::Head);
        check!(redirect_method(302, Method::Post) == Method::Get);
        check!(redirect_method(301, Method::Post) == Method::Get);
        check!(redirect_method(302, Method::Delete) == Method::Delete);
        check!(redirect_method(307, Method::Post) == Method::Post);
        check!(redirect_method(308, Method::Put) == Method::Put);
    }

    #[test]
    fn resolve_locations() {
        let_assert!(Ok(url) = resolve_redirect_url("https://x.com/a/b", "/new"));
        check!(url.as_str() == "https://x.com/new");
        let_assert!(Ok(url) = resolve_redirect_url("https://x.com/a/b", "c?d=1"));
        check!(url.as_str() == "https://x.com/a/c?d=1");
        let_assert!(Ok(url) = resolve_redirect_url("https://x.com/a", "https://y.com/z"));
        check!(url.as_str() == "https://y.com/z");
        check!(resolve_redirect_url("not a url", "/x").is_err());
    }

    #[test]
    fn post_to_get_drops_body_and_content_type() {
        let exchange = Exchange::builder(Method::Post, "https://x.com/form")
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body("{}")
            .build();

        let_assert!(Ok(next) = follow_up(&exchange, 302, "/done"));

        check!(next.method() == Method::Get);
        check!(next.url() == "https://x.com/done");
        check!(next.body().is_none());
        check!(next.header("Content-Type").is_none());
        check!(next.header("Accept") == Some("application/json"));
    }

    #[test]
    fn cross_origin_drops_authorization() {
        let exchange = Exchange::builder(Method::Put, "https://x.com/a")
            .header("authorization", "Bearer t")
            .body("payload")
            .build();

        let_assert!(Ok(same) = follow_up(&exchange, 307, "/b"));
        check!(same.header("authorization") == Some("Bearer t"));
        check!(same.body().is_some());

        let_assert!(Ok(other) = follow_up(&exchange, 307, "https://y.com/b"));
        check!(other.header("authorization").is_none());
        check!(other.method() == Method::Put);
    }

    #[tokio::test]
    async fn follows_chain_to_final_response() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&seen);
        let inner = service_fn(move |exchange: Exchange| {
            let recorded = Arc::clone(&recorded);
            async move {
                let url = exchange.url().to_string();
                recorded.lock().expect("lock").push(url.clone());
                Ok::<_, TransportError>(match url.as_str() {
                    "https://x.com/old" => redirect(301, "/mid"),
                    "https://x.com/mid" => redirect(302, "https://x.com/new"),
                    _ => Response::new(200, HashMap::new(), "done"),
                })
            }
        });

        let service = FollowRedirectLayer::new().layer(inner);
        let exchange = Exchange::builder(Method::Get, "https://x.com/old").build();
        let_assert!(Ok(response) = service.oneshot(exchange).await);

        check!(response.status() == 200);
        check!(
            *seen.lock().expect("lock")
                == ["https://x.com/old", "https://x.com/mid", "https://x.com/new"]
        );
    }

    #[tokio::test]
    async fn redirect_loop_hits_the_limit() {
        let inner = service_fn(|_: Exchange| async {
            Ok::<_, TransportError>(redirect(302, "/loop"))
        });

        let service = FollowRedirectLayer::with_max_redirects(2).layer(inner);
        let exchange = Exchange::builder(Method::Get, "https://x.com/loop").build();
        let result = service.oneshot(exchange).await;

        let_assert!(Err(TransportError::TooManyRedirects { max }) = result);
        check!(max == 2);
    }

    #[tokio::test]
    async fn redirect_without_location_is_returned() {
        let inner = service_fn(|_: Exchange| async {
            Ok::<_, TransportError>(Response::new(302, HashMap::new(), ""))
        });

        let service = FollowRedirectLayer::new().layer(inner);
        let exchange = Exchange::builder(Method::Get, "https://x.com/a").build();
        let_assert!(Ok(response) = service.oneshot(exchange).await);

        check!(response.status() == 302);
    }
}
