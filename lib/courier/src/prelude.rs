//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use courier_core::prelude::*;

pub use crate::{ApiClient, BearerAuth, ClientConfig, HyperTransport, connect, create_client};

#[cfg(feature = "basic-auth")]
pub use crate::BasicAuth;

pub use serde_json::json;
