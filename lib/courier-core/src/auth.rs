//! Authorization hook.
//!
//! The hook runs once per call, after query validation and before the body is
//! validated. It receives the request parts mutably and may rewrite anything
//! on them: headers, query, credentials.

use std::future::Future;
use std::pin::Pin;

use crate::{AuthError, RequestParts};

/// Future returned by [`Authorize::authorize`].
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AuthError>> + Send + 'a>>;

/// Hook injecting authorization into a request before it is sent.
///
/// Failures are returned to the caller unchanged as
/// [`Error::Authorization`](crate::Error::Authorization).
pub trait Authorize: Send + Sync {
    /// Mutate `request` in place.
    fn authorize<'a>(&'a self, request: &'a mut RequestParts) -> AuthFuture<'a>;
}

/// Synchronous hook backed by a closure. See [`authorize_fn`].
#[derive(Clone, Copy)]
pub struct AuthorizeFn<F>(F);

impl<F> std::fmt::Debug for AuthorizeFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthorizeFn")
    }
}

/// Wrap a synchronous closure as an [`Authorize`] hook.
///
/// ```
/// use courier_core::{Authorize, authorize_fn};
///
/// let hook = authorize_fn(|request| {
///     request.headers.insert("x-api-key".to_string(), "secret".to_string());
///     Ok(())
/// });
/// # let _ = &hook as &dyn Authorize;
/// ```
pub fn authorize_fn<F>(f: F) -> AuthorizeFn<F>
where
    F: Fn(&mut RequestParts) -> Result<(), AuthError> + Send + Sync,
{
    AuthorizeFn(f)
}

impl<F> Authorize for AuthorizeFn<F>
where
    F: Fn(&mut RequestParts) -> Result<(), AuthError> + Send + Sync,
{
    fn authorize<'a>(&'a self, request: &'a mut RequestParts) -> AuthFuture<'a> {
        Box::pin(std::future::ready((self.0)(request)))
    }
}
