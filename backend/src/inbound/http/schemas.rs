//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their serialized shape for documentation only.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::Account`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Account)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AccountSchema {
    /// Database identifier.
    #[schema(example = 42)]
    id: i64,
    /// Creation time, `%Y-%m-%d %H:%M:%S`.
    #[schema(example = "2026-01-05 09:30:00")]
    created_at: String,
    /// Last modification time, `%Y-%m-%d %H:%M:%S`.
    #[schema(example = "2026-01-05 09:30:00")]
    updated_at: String,
    /// Soft-delete time, `null` for live accounts.
    deleted_at: Option<String>,
    /// Application identifier at the config service.
    #[schema(example = "billing")]
    app_id: String,
    /// Deployment environment.
    #[schema(example = "dev")]
    env: String,
    /// Cluster inside the environment.
    #[schema(example = "default")]
    cluster_name: String,
    /// Namespace inside the cluster.
    #[schema(example = "application")]
    namespace_name: String,
}

/// OpenAPI schema for a paged account listing.
#[derive(ToSchema)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AccountListSchema {
    /// Accounts matching the listing, ignoring the window.
    #[schema(example = 25)]
    count: i64,
    /// Requested page, `-1` when pagination is disabled.
    #[schema(example = 2)]
    page: i64,
    /// Requested page size, `-1` when pagination is disabled.
    #[schema(example = 10)]
    page_size: i64,
    /// Accounts inside the window.
    result: Vec<AccountSchema>,
}
