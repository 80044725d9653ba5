//! Error types for courier.

use derive_more::{Display, Error};

use crate::{DecodeError, Method, ResponseData, ResponseType, SchemaError, TransportError};

/// Which value a schema rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ValidationTarget {
    /// Query parameters, validated before authorization.
    #[display("query")]
    Query,
    /// Request body, validated after authorization.
    #[display("request")]
    Request,
    /// Decoded response body.
    #[display("response")]
    Response,
}

/// Failure reported by an authorization hook, returned unchanged.
#[derive(Debug, Display)]
#[display("{_0}")]
pub struct AuthError(Box<dyn std::error::Error + Send + Sync>);

impl AuthError {
    /// Wrap any error raised by an authorization hook.
    pub fn new(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(error.into())
    }

    /// Borrow the hook's own error.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Consume into the hook's own error.
    #[must_use]
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.0
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Error returned by a pipeline call.
///
/// The first five variants form the pipeline taxonomy and always carry the
/// method and resolved URL. [`Error::Authorization`] passes a hook failure
/// through untouched.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// The host could not be reached.
    #[display("connection error: {method} {url}")]
    Connection {
        /// Request method.
        method: Method,
        /// Resolved request URL.
        url: String,
    },

    /// The transport failed for any other reason.
    #[display("unexpected error: {method} {url}: {source}")]
    Unexpected {
        /// Request method.
        method: Method,
        /// Resolved request URL.
        url: String,
        /// Original transport failure.
        source: TransportError,
    },

    /// The response body could not be decoded as declared.
    #[display("unexpected response format: expected {expected} from {method} {url}: {source}")]
    UnexpectedResponseFormat {
        /// Request method.
        method: Method,
        /// Resolved request URL.
        url: String,
        /// Response type the call declared.
        expected: ResponseType,
        /// Original decode failure.
        source: DecodeError,
    },

    /// A query, request or response schema rejected its value.
    #[display("{target} validation failed: {method} {url}\n{message}")]
    Validation {
        /// Request method.
        method: Method,
        /// Preview URL for query failures, final URL otherwise.
        url: String,
        /// Rejected value.
        target: ValidationTarget,
        /// Prettified schema failure.
        message: String,
    },

    /// The server answered with a non-success status.
    #[display("HTTP error {status_code} {status_text}: {method} {url}")]
    Http {
        /// Request method.
        method: Method,
        /// Resolved request URL.
        url: String,
        /// HTTP status code.
        status_code: u16,
        /// HTTP status text.
        status_text: String,
        /// Best-effort decoded body (`None` when decoding failed or for `raw`).
        response_data: Option<ResponseData>,
    },

    /// The authorization hook failed.
    #[display("authorization failed: {_0}")]
    Authorization(AuthError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify a transport failure as [`Error::Connection`] or [`Error::Unexpected`].
    #[must_use]
    pub fn from_transport(method: Method, url: impl Into<String>, source: TransportError) -> Self {
        let url = url.into();
        if source.is_network_failure() {
            Self::Connection { method, url }
        } else {
            Self::Unexpected {
                method,
                url,
                source,
            }
        }
    }

    /// Create a validation error from a schema failure.
    #[must_use]
    pub fn validation(
        method: Method,
        url: impl Into<String>,
        target: ValidationTarget,
        failure: &SchemaError,
    ) -> Self {
        Self::Validation {
            method,
            url: url.into(),
            target,
            message: failure.prettify(),
        }
    }

    /// Request method, absent for authorization failures.
    #[must_use]
    pub const fn method(&self) -> Option<Method> {
        match self {
            Self::Connection { method, .. }
            | Self::Unexpected { method, .. }
            | Self::UnexpectedResponseFormat { method, .. }
            | Self::Validation { method, .. }
            | Self::Http { method, .. } => Some(*method),
            Self::Authorization(_) => None,
        }
    }

    /// Resolved URL, absent for authorization failures.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Connection { url, .. }
            | Self::Unexpected { url, .. }
            | Self::UnexpectedResponseFormat { url, .. }
            | Self::Validation { url, .. }
            | Self::Http { url, .. } => Some(url.as_str()),
            Self::Authorization(_) => None,
        }
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Target of a validation error.
    #[must_use]
    pub const fn validation_target(&self) -> Option<ValidationTarget> {
        match self {
            Self::Validation { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Best-effort response data of an HTTP error.
    #[must_use]
    pub const fn response_data(&self) -> Option<&ResponseData> {
        match self {
            Self::Http { response_data, .. } => response_data.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Issue;

    #[test]
    fn transport_failures_are_classified() {
        let err = Error::from_transport(
            Method::Get,
            "https://api.x.com/v1",
            TransportError::connect("tcp connect error: Connection refused"),
        );
        assert!(err.is_connection());
        assert_eq!(err.to_string(), "connection error: GET https://api.x.com/v1");

        let err = Error::from_transport(
            Method::Post,
            "https://api.x.com/v1",
            TransportError::other("TypeError: Failed to fetch"),
        );
        assert!(err.is_connection());

        let err = Error::from_transport(
            Method::Post,
            "https://api.x.com/v1",
            TransportError::other("stream closed"),
        );
        assert!(matches!(err, Error::Unexpected { .. }));
        assert_eq!(
            err.to_string(),
            "unexpected error: POST https://api.x.com/v1: stream closed"
        );
    }

    #[test]
    fn validation_error_carries_prettified_message() {
        let failure = SchemaError::new(Issue::at("page", "expected a number"));
        let err = Error::validation(
            Method::Get,
            "https://api.x.com/v1?page=x",
            ValidationTarget::Query,
            &failure,
        );

        assert_eq!(err.validation_target(), Some(ValidationTarget::Query));
        insta::assert_snapshot!(err.to_string(), @r"
        query validation failed: GET https://api.x.com/v1?page=x
        ✖ expected a number
          → at page
        ");
    }

    #[test]
    fn error_status() {
        let err = Error::Http {
            method: Method::Get,
            url: "https://api.x.com/missing".to_string(),
            status_code: 404,
            status_text: "Not Found".to_string(),
            response_data: None,
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert_eq!(
            err.to_string(),
            "HTTP error 404 Not Found: GET https://api.x.com/missing"
        );
    }

    #[test]
    fn authorization_error_has_no_request_context() {
        let err = Error::Authorization(AuthError::new("token expired"));
        assert_eq!(err.method(), None);
        assert_eq!(err.url(), None);
        assert_eq!(err.to_string(), "authorization failed: token expired");
    }
}
