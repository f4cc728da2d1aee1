//! Transport layer for the API server.
//!
//! The HTTP transport binds the listener, builds the router and delegates
//! every request to the [`ApiServer`](crate::core::ApiServer).

mod error;
pub mod http;

pub use error::{TransportError, TransportResult};
pub use self::http::{HttpTransport, router};
