//! Error shared by the persistence ports.

use super::define_port_error;

define_port_error! {
    /// Failures raised by persistence adapters.
    pub enum PersistenceError {
        /// The requested row does not exist.
        NotFound => "record not found",
        /// Connection could not be established or was lost.
        Connection { message: String } => "persistence connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "persistence query failed: {message}",
    }
}
