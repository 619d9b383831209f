//! Request pipeline stages.
//!
//! Purpose: cross-cutting request concerns composed around handlers. Per
//! route, from the outside in: [`Action`], [`ResponseCapture`],
//! [`ErrorTranslation`], then [`Pagination`] on list routes. [`AccessLog`] and
//! [`Recover`] wrap the whole application.

pub mod access_log;
pub mod action;
pub mod capture;
pub mod pagination;
pub mod recover;
pub mod request_logger;
pub mod translation;

pub use access_log::AccessLog;
pub use action::Action;
pub use capture::{FinalOutcome, ResponseCapture};
pub use pagination::{Paginated, Pagination};
pub use recover::Recover;
pub use request_logger::{REQ_ID_HEADER, RequestLogger};
pub use translation::ErrorTranslation;
