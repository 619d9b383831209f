//! Access log stage.
//!
//! Outermost stage: one `access` record per request once the response is
//! ready, and a `req-id` response header echoing the correlation id.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::info;

use crate::logging::{self, ACCESS};

use super::{REQ_ID_HEADER, RequestLogger};

/// Middleware factory writing access log records.
///
/// # Examples
/// ```
/// use account_service::middleware::AccessLog;
/// use actix_web::App;
///
/// let _app = App::new().wrap(AccessLog);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl<S, B> Transform<S, ServiceRequest> for AccessLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessLogMiddleware { service }))
    }
}

/// Service wrapper produced by [`AccessLog`].
pub struct AccessLogMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AccessLogMiddleware<S>
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
        let started = Instant::now();
        let req_id = RequestLogger::ensure(req.request()).req_id().to_string();
        let method = req.method().to_string();
        let uri = req.uri().to_string();
        let client_ip = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or_default()
            .to_owned();
        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut outcome = fut.await;
            let status = match &mut outcome {
                Ok(res) => {
                    if let Ok(value) = HeaderValue::from_str(&req_id) {
                        res.headers_mut()
                            .insert(HeaderName::from_static(REQ_ID_HEADER), value);
                    }
                    res.status()
                }
                Err(err) => err.as_response_error().status_code(),
            };
            let cost = started.elapsed();
            logging::logger(ACCESS).in_scope(|| {
                info!(
                    method = %method,
                    cost = cost.as_secs_f64(),
                    client_ip = %client_ip,
                    user_agent = %user_agent,
                    status = status.as_u16(),
                    req_id = %req_id,
                    "{uri}"
                );
            });
            outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{self, TestRequest};
    use actix_web::{App, HttpResponse, web};

    #[actix_web::test]
    async fn echoes_request_id_header() {
        let app = test::init_service(
            App::new()
                .wrap(AccessLog)
                .route("/", web::get().to(|| async { HttpResponse::NoContent().finish() })),
        )
        .await;

        let res = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;

        assert_eq!(res.status(), actix_web::http::StatusCode::NO_CONTENT);
        let header = res
            .headers()
            .get(REQ_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .expect("req-id header");
        assert!(uuid::Uuid::parse_str(header).is_ok());
    }
}
