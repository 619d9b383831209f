//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_repository;
mod action_repository;
mod error_reporter;
mod namespace_lookup;
mod persistence_error;

pub use account_repository::AccountRepository;
pub use action_repository::ActionRepository;
pub use error_reporter::{ErrorReport, ErrorReporter};
pub use namespace_lookup::{NamespaceInfo, NamespaceLookup, NamespaceLookupError};
pub use persistence_error::PersistenceError;
