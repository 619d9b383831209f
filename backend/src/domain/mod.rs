//! Domain primitives, services, and ports.
//!
//! Purpose: keep account and audit rules free of HTTP and database types.
//! Inbound adapters translate requests into these types; outbound adapters
//! implement the traits in [`ports`].

pub mod account;
pub mod action;
pub mod audit;
pub mod auth;
pub mod json_time;
pub mod ports;
pub mod validation;

pub use self::account::{Account, AccountError, AccountPage, AccountService, NamespaceRef};
pub use self::action::{
    ActionRecord, ClientSnapshot, Level, RequestFacts, RequestSnapshot, ResponseSnapshot,
    ServerSnapshot,
};
pub use self::audit::{ActionHook, ActionHookError, ActionHooks, AuditError, AuditTrail};
pub use self::auth::AuthUser;
pub use self::validation::{FieldViolation, Rule, Validate, ValidationErrors};
