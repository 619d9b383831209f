//! Pagination stage for list routes.
//!
//! Resolves `page`, `page_size` and `is_pagination` from the query string
//! before dispatch. Valid values are stored in the request extensions and
//! read by handlers through [`Paginated`]; invalid values short-circuit with
//! a 400 envelope and the handler never runs.

use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use pagination::{PaginationParams, PaginationQuery};
use tracing::debug;

use crate::inbound::http::error::ErrorEnvelope;

/// Middleware factory resolving pagination parameters.
///
/// # Examples
/// ```
/// use account_service::middleware::Pagination;
/// use actix_web::{web, HttpResponse};
///
/// let route = web::get()
///     .to(|| async { HttpResponse::Ok().finish() })
///     .wrap(Pagination);
/// # let _ = route;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Pagination;

impl<S, B> Transform<S, ServiceRequest> for Pagination
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = PaginationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PaginationMiddleware { service }))
    }
}

/// Service wrapper produced by [`Pagination`].
pub struct PaginationMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for PaginationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match resolve(req.query_string()) {
            Ok(params) => {
                req.extensions_mut().insert(params);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(envelope) => {
                debug!(query = req.query_string(), error = %envelope, "rejected pagination query");
                let res = req.error_response(envelope);
                Box::pin(ready(Ok(res.map_into_right_body())))
            }
        }
    }
}

fn resolve(query_string: &str) -> Result<PaginationParams, ErrorEnvelope> {
    let query = web::Query::<PaginationQuery>::from_query(query_string)
        .map_err(|err| ErrorEnvelope::wrap_as(err, StatusCode::BAD_REQUEST))?;
    query
        .into_inner()
        .resolve()
        .map_err(|err| ErrorEnvelope::wrap_as(err, StatusCode::BAD_REQUEST))
}

/// Extractor yielding the parameters resolved by [`Pagination`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginated(pub PaginationParams);

impl FromRequest for Paginated {
    type Error = ErrorEnvelope;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let params = req.extensions().get::<PaginationParams>().copied();
        ready(params.map(Self).ok_or_else(|| {
            ErrorEnvelope::wrap("pagination parameters were not resolved for this route")
        }))
    }
}
