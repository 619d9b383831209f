//! Request-scoped logger carrying the correlation id.
//!
//! The first stage that needs it creates the logger and stores it in the
//! request extensions; every later stage reuses the same value, so the
//! `req_id` in the error body, the logs, and the audit record agree.

use actix_web::{HttpMessage, HttpRequest};
use tracing::Span;
use uuid::Uuid;

use crate::logging::{self, APIS};

/// Response header echoing the correlation id.
pub const REQ_ID_HEADER: &str = "req-id";

/// Per-request logger: a UUID plus a span carrying `req_id` and `uri`.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    req_id: Uuid,
    span: Span,
}

impl RequestLogger {
    /// Logger attached to `req`, created on first call.
    pub fn ensure(req: &HttpRequest) -> Self {
        if let Some(existing) = Self::get(req) {
            return existing;
        }
        let req_id = Uuid::new_v4();
        let parent = logging::logger(APIS);
        let logger = Self {
            req_id,
            span: tracing::info_span!(
                parent: parent.span(),
                "request",
                req_id = %req_id,
                uri = %req.uri(),
            ),
        };
        req.extensions_mut().insert(logger.clone());
        logger
    }

    /// Logger attached to `req`, if any stage created one.
    pub fn get(req: &HttpRequest) -> Option<Self> {
        req.extensions().get::<Self>().cloned()
    }

    /// Correlation id.
    pub fn req_id(&self) -> Uuid {
        self.req_id
    }

    /// Span events should be recorded under.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Run `f` with the request span entered.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn ensure_creates_once_per_request() {
        let req = TestRequest::get().uri("/v1/accounts").to_http_request();
        assert!(RequestLogger::get(&req).is_none());

        let first = RequestLogger::ensure(&req);
        let second = RequestLogger::ensure(&req);

        assert_eq!(first.req_id(), second.req_id());
        assert_eq!(RequestLogger::get(&req).map(|l| l.req_id()), Some(first.req_id()));
    }

    #[test]
    fn separate_requests_get_separate_ids() {
        let a = RequestLogger::ensure(&TestRequest::default().to_http_request());
        let b = RequestLogger::ensure(&TestRequest::default().to_http_request());
        assert_ne!(a.req_id(), b.req_id());
    }
}
