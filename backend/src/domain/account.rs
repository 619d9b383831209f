//! Account entity and the add/list service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pagination::PageWindow;
use serde::{Deserialize, Serialize};

use super::ports::{AccountRepository, NamespaceLookup, NamespaceLookupError, PersistenceError};
use super::validation::{Validate, ValidationErrors, Violations};

/// Config-service namespace an account is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRef {
    /// Application identifier at the config service.
    pub app_id: String,
    /// Deployment environment.
    pub env: String,
    /// Cluster inside the environment.
    pub cluster_name: String,
    /// Namespace inside the cluster.
    pub namespace_name: String,
}

impl Validate for NamespaceRef {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Violations::new()
            .require("app_id", &self.app_id)
            .require("env", &self.env)
            .require("cluster_name", &self.cluster_name)
            .require("namespace_name", &self.namespace_name)
            .finish()
    }
}

/// Persisted account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Database identifier.
    pub id: i64,
    /// Creation time.
    #[serde(with = "super::json_time")]
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    #[serde(with = "super::json_time")]
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    #[serde(with = "super::json_time::option")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Bound namespace.
    #[serde(flatten)]
    pub namespace: NamespaceRef,
}

/// One window of accounts plus the total row count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPage {
    /// Rows matching the listing, ignoring the window.
    pub count: i64,
    /// Rows inside the window.
    pub accounts: Vec<Account>,
}

/// Failures raised while adding an account.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The config service rejected or could not answer the lookup.
    #[error("namespace lookup failed: {0}")]
    Lookup(#[from] NamespaceLookupError),
    /// Storage failed.
    #[error("account storage failed: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Account use cases backed by the repository and namespace lookup ports.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    namespaces: Arc<dyn NamespaceLookup>,
}

impl AccountService {
    /// Wire the service to its ports.
    pub fn new(accounts: Arc<dyn AccountRepository>, namespaces: Arc<dyn NamespaceLookup>) -> Self {
        Self {
            accounts,
            namespaces,
        }
    }

    /// List accounts inside `window`.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn list(&self, window: PageWindow) -> Result<AccountPage, PersistenceError> {
        self.accounts.list(window).await
    }

    /// Confirm the namespace exists at the config service, then store it.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Lookup`] when the config service call fails
    /// and [`AccountError::Persistence`] when the insert fails.
    pub async fn add(&self, namespace: &NamespaceRef) -> Result<Account, AccountError> {
        self.namespaces.namespace_info(namespace).await?;
        Ok(self.accounts.create(namespace).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::NamespaceInfo;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubAccounts {
        created: Mutex<Vec<NamespaceRef>>,
    }

    #[async_trait]
    impl AccountRepository for StubAccounts {
        async fn list(&self, _window: PageWindow) -> Result<AccountPage, PersistenceError> {
            Ok(AccountPage::default())
        }

        async fn create(&self, namespace: &NamespaceRef) -> Result<Account, PersistenceError> {
            self.created
                .lock()
                .expect("accounts lock")
                .push(namespace.clone());
            let now = Utc::now();
            Ok(Account {
                id: 1,
                created_at: now,
                updated_at: now,
                deleted_at: None,
                namespace: namespace.clone(),
            })
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl NamespaceLookup for FailingLookup {
        async fn namespace_info(
            &self,
            _namespace: &NamespaceRef,
        ) -> Result<NamespaceInfo, NamespaceLookupError> {
            Err(NamespaceLookupError::status(404_u16, "no such namespace"))
        }
    }

    fn namespace() -> NamespaceRef {
        NamespaceRef {
            app_id: "billing".into(),
            env: "dev".into(),
            cluster_name: "default".into(),
            namespace_name: "application".into(),
        }
    }

    #[tokio::test]
    async fn failed_lookup_skips_insert() {
        let accounts = Arc::new(StubAccounts::default());
        let service = AccountService::new(accounts.clone(), Arc::new(FailingLookup));

        let err = service.add(&namespace()).await.expect_err("lookup fails");

        assert!(matches!(err, AccountError::Lookup(_)));
        assert!(accounts.created.lock().expect("accounts lock").is_empty());
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let err = NamespaceRef {
            app_id: String::new(),
            env: "dev".into(),
            cluster_name: String::new(),
            namespace_name: "application".into(),
        }
        .validate()
        .expect_err("invalid namespace");
        assert_eq!(err.message(), "'app_id' is required, 'cluster_name' is required");
    }

    #[test]
    fn account_serializes_flat_with_formatted_timestamps() {
        let created = DateTime::parse_from_rfc3339("2024-03-01T08:30:00Z")
            .expect("timestamp")
            .with_timezone(&Utc);
        let account = Account {
            id: 7,
            created_at: created,
            updated_at: created,
            deleted_at: None,
            namespace: namespace(),
        };
        let json = serde_json::to_value(&account).expect("serialize");
        assert_eq!(json["created_at"], "2024-03-01 08:30:00");
        assert_eq!(json["deleted_at"], serde_json::Value::Null);
        assert_eq!(json["namespace_name"], "application");
    }
}
