//! Panic recovery stage.
//!
//! A panic anywhere below this stage becomes a 500 [`ErrorBody`] carrying
//! the request id; the worker keeps serving. The request itself is gone
//! once a handler unwinds, so the response travels as an [`Error`] whose
//! rendering is that body.

use std::panic::AssertUnwindSafe;
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, HttpResponse};
use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::inbound::http::error::ErrorBody;

use super::{REQ_ID_HEADER, RequestLogger};

const PANIC_MESSAGE: &str = "internal server error";

/// Middleware factory turning panics into 500 responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recover;

impl<S, B> Transform<S, ServiceRequest> for Recover
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RecoverMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RecoverMiddleware { service }))
    }
}

/// Service wrapper produced by [`Recover`].
pub struct RecoverMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RecoverMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let logger = RequestLogger::ensure(req.request());
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| self.service.call(req))) {
            Ok(fut) => fut,
            Err(panic) => return Box::pin(ready(Err(recovered(&logger, &*panic)))),
        };
        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => Err(recovered(&logger, &*panic)),
            }
        })
    }
}

fn recovered(logger: &RequestLogger, panic: &(dyn std::any::Any + Send)) -> Error {
    let reason = panic
        .downcast_ref::<&str>()
        .map(|reason| (*reason).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_default();
    logger.in_scope(|| error!(panic = %reason, "request handler panicked"));

    let req_id = logger.req_id().to_string();
    let mut response = HttpResponse::InternalServerError();
    if let Ok(value) = HeaderValue::from_str(&req_id) {
        response.insert_header((HeaderName::from_static(REQ_ID_HEADER), value));
    }
    let response = response.json(ErrorBody {
        code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        message: PANIC_MESSAGE.to_owned(),
        req_id,
    });
    InternalError::from_response(PANIC_MESSAGE, response).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body;
    use actix_web::test::{self, TestRequest};
    use actix_web::{App, web};

    async fn explode() -> HttpResponse {
        panic!("boom")
    }

    async fn fine() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn panics_become_internal_errors() {
        let app = test::init_service(App::new().wrap(Recover).route("/", web::get().to(explode)))
            .await;

        let err = app
            .call(TestRequest::get().uri("/").to_request())
            .await
            .err()
            .expect("panic surfaces as an error");
        let res = err.error_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let header = res
            .headers()
            .get(REQ_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("req-id header");

        let bytes = body::to_bytes(res.into_body()).await.expect("body");
        let body: ErrorBody = serde_json::from_slice(&bytes).expect("error body");
        assert_eq!(body.code, 500);
        assert_eq!(body.message, PANIC_MESSAGE);
        assert_eq!(body.req_id, header);
        assert!(uuid::Uuid::parse_str(&body.req_id).is_ok());
    }

    #[actix_web::test]
    async fn routed_requests_pass_through() {
        let app = test::init_service(
            App::new()
                .wrap(Recover)
                .route("/ok", web::get().to(fine))
                .service(web::scope("/v1").route("/health/check", web::get().to(fine))),
        )
        .await;

        let res = test::call_service(&app, TestRequest::get().uri("/ok").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res =
            test::call_service(&app, TestRequest::get().uri("/v1/health/check").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
