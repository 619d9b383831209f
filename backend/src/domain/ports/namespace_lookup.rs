//! Port for the external configuration service.

use async_trait::async_trait;

use crate::domain::NamespaceRef;

use super::define_port_error;

/// Namespace description as returned by the config service.
pub type NamespaceInfo = serde_json::Map<String, serde_json::Value>;

define_port_error! {
    /// Failures raised while talking to the config service.
    pub enum NamespaceLookupError {
        /// The configured endpoint cannot address the namespace.
        InvalidEndpoint { message: String } => "config service endpoint is invalid: {message}",
        /// The request could not be sent or no response arrived in time.
        Transport { message: String } => "config service transport failed: {message}",
        /// The config service answered outside the 2xx range.
        Status { status: u16, message: String } => "{message}",
        /// The response body was not the expected JSON.
        Decode { message: String } => "config service response malformed: {message}",
    }
}

/// Resolve namespaces at the config service.
#[async_trait]
pub trait NamespaceLookup: Send + Sync {
    /// Fetch the description of `namespace`.
    async fn namespace_info(
        &self,
        namespace: &NamespaceRef,
    ) -> Result<NamespaceInfo, NamespaceLookupError>;
}
