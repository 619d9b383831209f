//! Audit trail service: hook registry plus the two-phase record writes.
//!
//! The middleware calls [`AuditTrail::record_before`] before dispatch and
//! [`AuditTrail::record_after`] once the response is final. Hooks are looked
//! up by operation identifier in an explicit [`ActionHooks`] registry.

use std::collections::HashMap;
use std::sync::Arc;

use super::ports::{ActionRepository, PersistenceError};
use super::{ActionRecord, NamespaceRef};

/// Operation identifier for account creation.
pub const ADD_ACCOUNT: &str = "AddAccount";

/// Hook adjusting a record; receives the raw request body.
pub type ActionHook = fn(&mut ActionRecord, &[u8]) -> Result<(), ActionHookError>;

/// Failure reported by an [`ActionHook`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("action hook failed: {message}")]
pub struct ActionHookError {
    message: String,
}

impl ActionHookError {
    /// Create a hook failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failures while writing an audit record. Never surfaced to clients.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// A registered hook rejected the record; it was not written.
    #[error("{operation}: {source}")]
    Hook {
        /// Operation whose hook failed.
        operation: String,
        /// Hook failure.
        source: ActionHookError,
    },
    /// The repository write failed.
    #[error("{operation}: {source}")]
    Persistence {
        /// Operation being audited.
        operation: String,
        /// Repository failure.
        source: PersistenceError,
    },
}

/// Registry of per-operation before/after hooks.
#[derive(Debug, Clone, Default)]
pub struct ActionHooks {
    before: HashMap<&'static str, ActionHook>,
    after: HashMap<&'static str, ActionHook>,
}

impl ActionHooks {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the hooks of the account routes.
    pub fn standard() -> Self {
        Self::new().with_before(ADD_ACCOUNT, describe_namespace)
    }

    /// Register the hook run before the first write of `operation`.
    #[must_use]
    pub fn with_before(mut self, operation: &'static str, hook: ActionHook) -> Self {
        self.before.insert(operation, hook);
        self
    }

    /// Register the hook run before the final write of `operation`.
    #[must_use]
    pub fn with_after(mut self, operation: &'static str, hook: ActionHook) -> Self {
        self.after.insert(operation, hook);
        self
    }

    /// Hook registered to run before dispatch.
    pub fn before(&self, operation: &str) -> Option<ActionHook> {
        self.before.get(operation).copied()
    }

    /// Hook registered to run after the response is final.
    pub fn after(&self, operation: &str) -> Option<ActionHook> {
        self.after.get(operation).copied()
    }
}

/// Put the target namespace of an add request into the detail.
///
/// Bodies that do not parse are left for the handler to reject.
fn describe_namespace(record: &mut ActionRecord, body: &[u8]) -> Result<(), ActionHookError> {
    if let Ok(namespace) = serde_json::from_slice::<NamespaceRef>(body) {
        record.append_detail(&format!(
            "namespace {}/{}/{}/{}",
            namespace.app_id, namespace.env, namespace.cluster_name, namespace.namespace_name
        ));
    }
    Ok(())
}

/// Two-phase audit writer.
#[derive(Clone)]
pub struct AuditTrail {
    actions: Arc<dyn ActionRepository>,
    hooks: ActionHooks,
}

impl AuditTrail {
    /// Wire the service to its repository and hooks.
    pub fn new(actions: Arc<dyn ActionRepository>, hooks: ActionHooks) -> Self {
        Self { actions, hooks }
    }

    /// Run the before hook and insert the request half of `record`.
    ///
    /// On success `record.id` holds the new row id.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the hook or the insert fails; the record
    /// keeps `id == None` so the final write inserts instead.
    pub async fn record_before(
        &self,
        record: &mut ActionRecord,
        body: &[u8],
    ) -> Result<(), AuditError> {
        if let Some(hook) = self.hooks.before(&record.operation) {
            hook(record, body).map_err(|source| AuditError::Hook {
                operation: record.operation.clone(),
                source,
            })?;
        }
        let id = self
            .actions
            .create(record)
            .await
            .map_err(|source| AuditError::Persistence {
                operation: record.operation.clone(),
                source,
            })?;
        record.id = Some(id);
        Ok(())
    }

    /// Fill the response half of `record` and persist it.
    ///
    /// `status` and `body` must be what the client received.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the after hook or the save fails.
    pub async fn record_after(
        &self,
        record: &mut ActionRecord,
        status: u16,
        body: &[u8],
    ) -> Result<(), AuditError> {
        record.finish(status, body);
        if let Some(hook) = self.hooks.after(&record.operation) {
            hook(record, body).map_err(|source| AuditError::Hook {
                operation: record.operation.clone(),
                source,
            })?;
        }
        let id = self
            .actions
            .save(record)
            .await
            .map_err(|source| AuditError::Persistence {
                operation: record.operation.clone(),
                source,
            })?;
        record.id = Some(id);
        Ok(())
    }
}
