//! Talking to the sqlmate server.
//!
//! [wire] holds the request and response bodies, [transport] moves them over HTTP and
//! [client::ApiClient] has one method per endpoint.
pub mod client;
pub mod transport;
pub mod wire;

pub use client::ApiClient;
pub use transport::{HttpTransport, Transport};
