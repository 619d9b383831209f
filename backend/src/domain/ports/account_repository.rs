//! Port abstraction for account persistence.

use async_trait::async_trait;
use pagination::PageWindow;

use crate::domain::{Account, AccountPage, NamespaceRef};

use super::PersistenceError;

/// Storage for [`Account`] rows.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Count all live accounts and load the ones inside `window`, ordered by id.
    async fn list(&self, window: PageWindow) -> Result<AccountPage, PersistenceError>;

    /// Insert a new account bound to `namespace`.
    async fn create(&self, namespace: &NamespaceRef) -> Result<Account, PersistenceError>;
}
