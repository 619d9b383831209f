//! Port abstraction for audit record persistence.

use async_trait::async_trait;

use crate::domain::ActionRecord;

use super::PersistenceError;

/// Storage for [`ActionRecord`] rows.
#[async_trait]
pub trait ActionRepository: Send + Sync {
    /// Insert `record` and return its identifier.
    async fn create(&self, record: &ActionRecord) -> Result<i64, PersistenceError>;

    /// Update the row identified by `record.id`, inserting a new row when
    /// the record has no identifier yet. Returns the row identifier.
    async fn save(&self, record: &ActionRecord) -> Result<i64, PersistenceError>;
}
