//! Tower middleware for [`HyperTransport`](crate::HyperTransport).
//!
//! Layers wrap the exchange service: they see every [`Exchange`](crate::Exchange)
//! going out and every [`Response`](crate::Response) or
//! [`TransportError`](crate::TransportError) coming back.
//!
//! ```ignore
//! use courier::HyperTransport;
//! use courier::middleware::LoggingLayer;
//!
//! let transport = HyperTransport::builder()
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```

mod follow_redirect;
mod logging;

pub use follow_redirect::{DEFAULT_MAX_REDIRECTS, FollowRedirect, FollowRedirectLayer};
pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
