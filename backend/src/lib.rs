//! Account service library.
//!
//! Hexagonal layout: [`domain`] holds the account and audit rules behind
//! ports, [`inbound`] adapts HTTP requests, [`outbound`] implements the
//! ports against PostgreSQL and the config service, and [`middleware`]
//! carries the request pipeline stages.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod logging;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
