//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` and only reach
//! domain services, so they stay testable with in-memory ports.

use std::sync::Arc;

use crate::domain::AccountService;
use crate::domain::ports::{AccountRepository, NamespaceLookup};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Account use cases.
    pub accounts: AccountService,
}

impl HttpState {
    /// Build state from the account ports.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use account_service::inbound::http::state::HttpState;
    /// use account_service::test_support::{InMemoryAccountRepository, StubNamespaceLookup};
    ///
    /// let state = HttpState::new(
    ///     Arc::new(InMemoryAccountRepository::default()),
    ///     Arc::new(StubNamespaceLookup::found()),
    /// );
    /// let _service = state.accounts.clone();
    /// ```
    pub fn new(accounts: Arc<dyn AccountRepository>, namespaces: Arc<dyn NamespaceLookup>) -> Self {
        Self {
            accounts: AccountService::new(accounts, namespaces),
        }
    }
}
