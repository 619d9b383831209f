//! Error translation stage.
//!
//! Collects the envelopes a handler pushed through
//! [`ErrorSink`](crate::inbound::http::error::ErrorSink) plus whatever error
//! the inner stages returned, logs every one of them, reports server-side
//! failures and replaces the response with a single [`ErrorBody`] built from
//! the first failure.

use std::slice;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::error::InternalError;
use actix_web::{Error, HttpResponse, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, error};

use crate::domain::ports::{ErrorReport, ErrorReporter};
use crate::inbound::http::error::{ErrorBody, ErrorEnvelope, RequestErrors};

use super::RequestLogger;

/// Middleware factory translating failures into JSON error bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTranslation;

impl<S, B> Transform<S, ServiceRequest> for ErrorTranslation
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ErrorTranslationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorTranslationMiddleware { service }))
    }
}

/// Service wrapper produced by [`ErrorTranslation`].
pub struct ErrorTranslationMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ErrorTranslationMiddleware<S>
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
        // Scope-level mounts run before routing; holding a request clone
        // across the inner call would break route matching.
        let logger = RequestLogger::ensure(req.request());
        let reporter = req.app_data::<web::Data<dyn ErrorReporter>>().cloned();
        let fut = self.service.call(req);
        Box::pin(async move {
            match fut.await {
                Ok(res) => {
                    let mut failures: Vec<Failure> = RequestErrors::take(res.request())
                        .iter()
                        .map(Failure::from_envelope)
                        .collect();
                    failures.extend(res.response().error().map(Failure::from_error));
                    match translate(&logger, reporter.as_deref().map(|v| &**v), &failures) {
                        Some(response) => Ok(res.into_response(response).map_into_right_body()),
                        None => Ok(res.map_into_left_body()),
                    }
                }
                Err(err) => {
                    let failure = Failure::from_error(&err);
                    let response = translate(&logger, reporter.as_deref().map(|v| &**v), slice::from_ref(&failure))
                        .unwrap_or_else(|| err.error_response());
                    Err(InternalError::from_response(failure.message, response).into())
                }
            }
        })
    }
}

/// Log and report `failures`, then build the body for the first one.
fn translate(
    logger: &RequestLogger,
    reporter: Option<&dyn ErrorReporter>,
    failures: &[Failure],
) -> Option<HttpResponse> {
    let first = failures.first()?;
    let req_id = logger.req_id().to_string();
    logger.in_scope(|| failures.iter().for_each(Failure::log));
    if let Some(reporter) = reporter {
        report(reporter, &req_id, failures);
    }
    Some(HttpResponse::build(first.status).json(ErrorBody {
        code: first.status.as_u16(),
        message: first.message.clone(),
        req_id,
    }))
}

/// One failure observed during a request, flattened for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Failure {
    status: StatusCode,
    message: String,
    location: Option<String>,
    detail: String,
}

impl Failure {
    fn from_envelope(envelope: &ErrorEnvelope) -> Self {
        let location = envelope.location();
        Self {
            status: envelope.code(),
            message: envelope.message(),
            location: Some(format!("{}:{}", location.file(), location.line())),
            detail: envelope.detail(),
        }
    }

    fn from_error(err: &Error) -> Self {
        if let Some(envelope) = err.as_error::<ErrorEnvelope>() {
            return Self::from_envelope(envelope);
        }
        Self {
            status: err.as_response_error().status_code(),
            message: err.to_string(),
            location: None,
            detail: format!("{err:?}"),
        }
    }

    fn log(&self) {
        let line = self.location.as_deref().unwrap_or_default();
        if self.status.is_server_error() {
            error!(
                line,
                stack = %self.detail,
                "http {} caused by {}",
                self.status.as_u16(),
                self.message
            );
        } else {
            debug!(
                line,
                stack = %self.detail,
                "http {} caused by {}",
                self.status.as_u16(),
                self.message
            );
        }
    }
}

fn report(reporter: &dyn ErrorReporter, req_id: &str, failures: &[Failure]) {
    failures
        .iter()
        .filter(|failure| failure.status.is_server_error())
        .for_each(|failure| {
            reporter.report(&ErrorReport {
                req_id: req_id.to_owned(),
                status: failure.status.as_u16(),
                message: failure.message.clone(),
                location: failure.location.clone(),
                detail: failure.detail.clone(),
            });
        });
}
