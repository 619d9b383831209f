//! PostgreSQL-backed `ActionRepository` implementation using Diesel ORM.
//!
//! `save` updates the row named by the record id and falls back to an insert
//! when the record was never stored or the row is gone.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use crate::domain::ActionRecord;
use crate::domain::ports::{ActionRepository, PersistenceError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::ActionRow;
use super::pool::DbPool;
use super::schema::actions;

/// Diesel-backed audit storage.
#[derive(Clone)]
pub struct DieselActionRepository {
    pool: DbPool,
}

impl DieselActionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_json(value: &impl Serialize) -> Result<serde_json::Value, PersistenceError> {
    serde_json::to_value(value).map_err(|err| PersistenceError::query(err.to_string()))
}

fn record_to_row(record: &ActionRecord) -> Result<ActionRow, PersistenceError> {
    Ok(ActionRow {
        created_at: record.created_at,
        updated_at: record.updated_at,
        deleted_at: record.deleted_at,
        client: to_json(&record.client)?,
        server: to_json(&record.server)?,
        request: to_json(&record.request)?,
        response: record.response.as_ref().map(to_json).transpose()?,
        operation: record.operation.clone(),
        detail: record.detail.clone(),
        level: record.level.code(),
        tag: record.tag,
        user_label: record.user.clone(),
    })
}

#[async_trait]
impl ActionRepository for DieselActionRepository {
    async fn create(&self, record: &ActionRecord) -> Result<i64, PersistenceError> {
        let row = record_to_row(record)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(actions::table)
            .values(&row)
            .returning(actions::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn save(&self, record: &ActionRecord) -> Result<i64, PersistenceError> {
        let row = record_to_row(record)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        if let Some(id) = record.id {
            let updated: Option<i64> = diesel::update(actions::table.find(id))
                .set(&row)
                .returning(actions::id)
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            if let Some(stored) = updated {
                return Ok(stored);
            }
        }

        diesel::insert_into(actions::table)
            .values(&row)
            .returning(actions::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Level, RequestFacts};

    #[test]
    fn rows_carry_level_code_and_user_label() {
        let mut record = ActionRecord::begin(&RequestFacts {
            operation: "AddAccount",
            client_ip: "127.0.0.1",
            host: "localhost",
            path: "/v1/accounts",
            body: b"{}",
            request_id: "req",
            user: None,
        });
        record.finish(500, br#"{"message":"boom"}"#);

        let row = record_to_row(&record).expect("serializable record");

        assert_eq!(row.level, Level::Error.code());
        assert_eq!(row.user_label, "anonymous");
        assert_eq!(row.client, serde_json::json!({"ip": "127.0.0.1"}));
        assert_eq!(
            row.response,
            Some(serde_json::json!({"status_code": 500, "data": {"message": "boom"}}))
        );
    }
}
