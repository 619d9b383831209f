//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer; repositories convert them
//! to and from domain values.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{accounts, actions};

/// Row read from `accounts`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub app_id: String,
    pub env: String,
    pub cluster_name: String,
    pub namespace_name: String,
}

/// Insertable account.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub(crate) struct NewAccountRow<'a> {
    pub app_id: &'a str,
    pub env: &'a str,
    pub cluster_name: &'a str,
    pub namespace_name: &'a str,
}

/// Full audit row, used for both insert and upsert.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = actions)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ActionRow {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub client: serde_json::Value,
    pub server: serde_json::Value,
    pub request: serde_json::Value,
    pub response: Option<serde_json::Value>,
    pub operation: String,
    pub detail: String,
    pub level: i16,
    pub tag: i32,
    pub user_label: String,
}
