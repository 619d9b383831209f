//! HTTP inbound adapter exposing the REST endpoints.

pub mod accounts;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod schemas;
pub mod state;

pub use error::ApiResult;
pub use pipeline::{AppDependencies, RouteTable, build_app};
