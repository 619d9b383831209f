//! Capability for forwarding server-side failures to an error tracker.

/// Server failure worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Request correlation id.
    pub req_id: String,
    /// HTTP status sent to the client.
    pub status: u16,
    /// Message sent to the client.
    pub message: String,
    /// Source location where the failure was wrapped, when known.
    pub location: Option<String>,
    /// Full error detail.
    pub detail: String,
}

/// Sink for [`ErrorReport`]s. Implementations must not block.
pub trait ErrorReporter: Send + Sync {
    /// Forward one report.
    fn report(&self, report: &ErrorReport);
}
