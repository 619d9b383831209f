//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **config_service**: reqwest client for the namespace config service
//! - **error_reporting**: tracing-backed error reporter
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod config_service;
pub mod error_reporting;
pub mod persistence;
