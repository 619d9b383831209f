//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations translate between Diesel rows and domain
//! values; row structs and table definitions stay private to this module.

mod diesel_account_repository;
mod diesel_action_repository;
mod error_mapping;
pub mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_action_repository::DieselActionRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
