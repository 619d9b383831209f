//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Accounts bound to config-service namespaces. Soft-deleted rows keep
    /// `deleted_at` set and are excluded from listings.
    accounts (id) {
        id -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
        app_id -> Varchar,
        env -> Varchar,
        cluster_name -> Varchar,
        namespace_name -> Varchar,
    }
}

diesel::table! {
    /// Audit records, one per audited request.
    actions (id) {
        id -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
        client -> Jsonb,
        server -> Jsonb,
        request -> Jsonb,
        response -> Nullable<Jsonb>,
        operation -> Varchar,
        detail -> Text,
        level -> Int2,
        tag -> Int4,
        #[sql_name = "user"]
        user_label -> Varchar,
    }
}
