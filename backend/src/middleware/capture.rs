//! Response capture stage.
//!
//! Buffers the body produced by the inner stages, stores it once as the
//! request's [`FinalOutcome`] and hands an identical response to the outer
//! stages. Outer consumers read the outcome instead of inspecting errors a
//! second time.

use std::error::Error as StdError;
use std::task::{Context, Poll};

use actix_web::body::{self, BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::web::Bytes;
use actix_web::{Error, HttpMessage, HttpRequest, error};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde::Deserialize;

/// Status and body the client receives, fixed once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalOutcome {
    status: StatusCode,
    body: Bytes,
}

impl FinalOutcome {
    /// Record the outcome for `req`.
    ///
    /// Only the first call per request takes effect; returns whether this
    /// call was the one that stored it.
    pub fn finalize(req: &HttpRequest, status: StatusCode, body: Bytes) -> bool {
        let mut extensions = req.extensions_mut();
        if extensions.contains::<Self>() {
            return false;
        }
        extensions.insert(Self { status, body });
        true
    }

    /// Outcome stored for `req`, if capture ran.
    pub fn of(req: &HttpRequest) -> Option<Self> {
        req.extensions().get::<Self>().cloned()
    }

    /// Outcome with a status but no body, for routes without capture.
    pub fn status_only(status: StatusCode) -> Self {
        Self {
            status,
            body: Bytes::new(),
        }
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// `message` field of a JSON error body.
    pub fn message(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct Fields {
            message: String,
        }

        serde_json::from_slice::<Fields>(&self.body)
            .ok()
            .map(|fields| fields.message)
    }
}

/// Middleware factory buffering response bodies into [`FinalOutcome`].
///
/// Mount on routes only: the stage keeps the request to answer inner errors,
/// and a request shared before routing cannot be matched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseCapture;

impl<S, B> Transform<S, ServiceRequest> for ResponseCapture
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ResponseCaptureMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ResponseCaptureMiddleware { service }))
    }
}

/// Service wrapper produced by [`ResponseCapture`].
pub struct ResponseCaptureMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ResponseCaptureMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let http_req = req.request().clone();
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = match fut.await {
                Ok(res) => res.map_into_boxed_body(),
                Err(err) => ServiceResponse::from_err(err, http_req),
            };
            let (request, response) = res.into_parts();
            let (head, payload) = response.into_parts();
            let bytes = body::to_bytes(payload).await.map_err(|err| {
                let err: Box<dyn StdError> = err.into();
                error::ErrorInternalServerError(err.to_string())
            })?;
            FinalOutcome::finalize(&request, head.status(), bytes.clone());
            let response = head.set_body(bytes).map_into_boxed_body();
            Ok(ServiceResponse::new(request, response))
        })
    }
}
