//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::PageWindow;

use crate::domain::ports::{AccountRepository, PersistenceError};
use crate::domain::{Account, AccountPage, NamespaceRef};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AccountRow, NewAccountRow};
use super::pool::DbPool;
use super::schema::accounts;

/// Diesel-backed account storage. Listings skip soft-deleted rows.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_account(row: AccountRow) -> Account {
    Account {
        id: row.id,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
        namespace: NamespaceRef {
            app_id: row.app_id,
            env: row.env,
            cluster_name: row.cluster_name,
            namespace_name: row.namespace_name,
        },
    }
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn list(&self, window: PageWindow) -> Result<AccountPage, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: i64 = accounts::table
            .filter(accounts::deleted_at.is_null())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut query = accounts::table
            .filter(accounts::deleted_at.is_null())
            .order(accounts::id.asc())
            .offset(window.offset)
            .select(AccountRow::as_select())
            .into_boxed();
        if let Some(limit) = window.limit {
            query = query.limit(limit);
        }
        let rows: Vec<AccountRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;

        Ok(AccountPage {
            count,
            accounts: rows.into_iter().map(row_to_account).collect(),
        })
    }

    async fn create(&self, namespace: &NamespaceRef) -> Result<Account, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(accounts::table)
            .values(NewAccountRow {
                app_id: &namespace.app_id,
                env: &namespace.env,
                cluster_name: &namespace.cluster_name,
                namespace_name: &namespace.namespace_name,
            })
            .returning(AccountRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_account(row))
    }
}
