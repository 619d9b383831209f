//! Audit stage writing one action record per request.
//!
//! Before dispatch the request half (client, server, path, body) is stored;
//! after the inner stages finish the record is completed from the request's
//! [`FinalOutcome`], so it reflects the translated response rather than the
//! handler's own. Audit failures are logged and never reach the client.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::web::{self, Bytes, BytesMut};
use actix_web::{Error, HttpMessage};
use futures_util::StreamExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::warn;

use crate::domain::{ActionRecord, AuditTrail, AuthUser, RequestFacts};
use crate::logging::{self, MIDDLEWARES};

use super::{FinalOutcome, RequestLogger};

/// Middleware factory auditing one operation.
///
/// # Examples
/// ```
/// use account_service::middleware::{Action, ResponseCapture};
/// use actix_web::{web, HttpResponse};
///
/// let route = web::post()
///     .to(|| async { HttpResponse::Ok().finish() })
///     .wrap(ResponseCapture)
///     .wrap(Action::new("AddAccount"));
/// # let _ = route;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Action {
    operation: &'static str,
}

impl Action {
    /// Audit requests as `operation`.
    pub const fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Action
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ActionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ActionMiddleware {
            service: Rc::new(service),
            operation: self.operation,
        }))
    }
}

/// Service wrapper produced by [`Action`].
pub struct ActionMiddleware<S> {
    service: Rc<S>,
    operation: &'static str,
}

impl<S, B> Service<ServiceRequest> for ActionMiddleware<S>
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

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let operation = self.operation;
        Box::pin(async move {
            let Some(trail) = req.app_data::<web::Data<AuditTrail>>().cloned() else {
                logging::logger(MIDDLEWARES)
                    .in_scope(|| warn!(operation, "audit trail not configured, skipping"));
                return service.call(req).await;
            };

            let body = buffer_body(&mut req).await?;
            let logger = RequestLogger::ensure(req.request());
            let mut record = begin_record(&req, operation, &body, &logger);
            if let Err(err) = trail.record_before(&mut record, &body).await {
                logger.in_scope(|| warn!(error = %err, "failed to store action before dispatch"));
            }

            let outcome = service.call(req).await;

            let final_outcome = match &outcome {
                Ok(res) => FinalOutcome::of(res.request())
                    .unwrap_or_else(|| FinalOutcome::status_only(res.status())),
                Err(err) => FinalOutcome::status_only(err.as_response_error().status_code()),
            };
            if let Err(err) = trail
                .record_after(
                    &mut record,
                    final_outcome.status().as_u16(),
                    final_outcome.body(),
                )
                .await
            {
                logger.in_scope(|| warn!(error = %err, "failed to store action after dispatch"));
            }
            outcome
        })
    }
}

fn begin_record(
    req: &ServiceRequest,
    operation: &str,
    body: &[u8],
    logger: &RequestLogger,
) -> ActionRecord {
    let connection = req.connection_info().clone();
    let user = req.extensions().get::<AuthUser>().cloned();
    let request_id = logger.req_id().to_string();
    ActionRecord::begin(&RequestFacts {
        operation,
        client_ip: connection.realip_remote_addr().unwrap_or_default(),
        host: connection.host(),
        path: req.path(),
        body,
        request_id: &request_id,
        user: user.as_ref(),
    })
}

/// Read the whole request body and put it back for the handler.
async fn buffer_body(req: &mut ServiceRequest) -> Result<Bytes, Error> {
    let mut payload = req.take_payload();
    let mut buffered = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        buffered.extend_from_slice(&chunk?);
    }
    let body = buffered.freeze();

    let (_, mut restored) = actix_http::h1::Payload::create(true);
    restored.unread_data(body.clone());
    req.set_payload(actix_http::Payload::from(restored));
    Ok(body)
}
