//! Stock authorization hooks.
//!
//! Both set the `authorization` header unless the request already carries one.

use std::sync::Arc;

use courier_core::{AuthFuture, Authorize, RequestParts};

const AUTHORIZATION: &str = "authorization";

fn has_authorization(request: &RequestParts) -> bool {
    request
        .headers
        .keys()
        .any(|name| name.eq_ignore_ascii_case(AUTHORIZATION))
}

/// `Authorization: Bearer <token>` hook.
///
/// ```
/// use courier::{BearerAuth, ClientConfig};
///
/// let config = ClientConfig::builder("https://api.x.com")
///     .authorization(BearerAuth::new("my-secret-token"))
///     .build();
/// # assert!(config.authorization().is_some());
/// ```
#[derive(Clone)]
pub struct BearerAuth {
    header: Arc<str>,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

impl BearerAuth {
    /// Hook sending the given token.
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            header: Arc::from(format!("Bearer {}", token.as_ref())),
        }
    }
}

impl Authorize for BearerAuth {
    fn authorize<'a>(&'a self, request: &'a mut RequestParts) -> AuthFuture<'a> {
        if !has_authorization(request) {
            request
                .headers
                .insert(AUTHORIZATION.to_string(), self.header.to_string());
        }
        Box::pin(std::future::ready(Ok(())))
    }
}

/// `Authorization: Basic <base64(user:password)>` hook.
#[cfg(feature = "basic-auth")]
#[derive(Clone)]
pub struct BasicAuth {
    header: Arc<str>,
}

#[cfg(feature = "basic-auth")]
impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth").finish_non_exhaustive()
    }
}

#[cfg(feature = "basic-auth")]
impl BasicAuth {
    /// Hook sending the given credentials.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        use base64::Engine;

        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        Self {
            header: Arc::from(format!("Basic {encoded}")),
        }
    }
}

#[cfg(feature = "basic-auth")]
impl Authorize for BasicAuth {
    fn authorize<'a>(&'a self, request: &'a mut RequestParts) -> AuthFuture<'a> {
        if !has_authorization(request) {
            request
                .headers
                .insert(AUTHORIZATION.to_string(), self.header.to_string());
        }
        Box::pin(std::future::ready(Ok(())))
    }
}
