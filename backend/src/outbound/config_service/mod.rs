//! Config-service client: shared REST plumbing plus the namespace lookup
//! adapter built on it.

mod namespace_client;
mod rest_client;

pub use namespace_client::HttpNamespaceLookup;
pub use rest_client::{DEFAULT_TIMEOUT, RestClient, RestError};
