//! HTTP-facing error envelope and status classification.
//!
//! Purpose: handlers never format error responses themselves. They wrap the
//! failure in an [`ErrorEnvelope`] (recording where it was wrapped) and
//! either return it or push it through [`ErrorSink`]. The translation stage
//! resolves the status with [`ErrorEnvelope::code`] and writes the
//! [`ErrorBody`].

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;

use actix_web::dev::Payload;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError};
use futures_util::future::{Ready, ready};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ValidationErrors;
use crate::domain::ports::PersistenceError;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ErrorEnvelope>;

/// Boxed failure carried by an envelope.
pub type Origin = Box<dyn StdError + Send + Sync + 'static>;

/// JSON body sent for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// HTTP status code.
    #[schema(example = 400)]
    pub code: u16,
    /// Human-readable summary.
    #[schema(example = "'app_id' is required")]
    pub message: String,
    /// Request correlation id.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub req_id: String,
}

/// A failure paired with its HTTP classification and wrap location.
///
/// # Examples
/// ```
/// use account_service::inbound::http::error::ErrorEnvelope;
/// use actix_web::http::StatusCode;
///
/// let envelope = ErrorEnvelope::wrap_as("quota exceeded", StatusCode::TOO_MANY_REQUESTS);
/// assert_eq!(envelope.code(), StatusCode::TOO_MANY_REQUESTS);
/// assert_eq!(envelope.message(), "quota exceeded");
/// ```
#[derive(Debug)]
pub struct ErrorEnvelope {
    origin: Origin,
    status_override: Option<StatusCode>,
    location: &'static Location<'static>,
}

impl ErrorEnvelope {
    /// Wrap `err`, letting the classification table pick the status.
    #[track_caller]
    pub fn wrap(err: impl Into<Origin>) -> Self {
        Self {
            origin: err.into(),
            status_override: None,
            location: Location::caller(),
        }
    }

    /// Wrap `err` with an explicit status.
    ///
    /// The override loses only to the not-found sentinel.
    #[track_caller]
    pub fn wrap_as(err: impl Into<Origin>, status: StatusCode) -> Self {
        Self {
            origin: err.into(),
            status_override: Some(status),
            location: Location::caller(),
        }
    }

    /// The wrapped failure.
    pub fn origin(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.origin.as_ref()
    }

    /// Source location of the wrap call.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Status supplied at wrap time, if any.
    pub fn status_override(&self) -> Option<StatusCode> {
        self.status_override
    }

    /// Resolved HTTP status.
    ///
    /// Order: not-found sentinel anywhere in the source chain (404), then
    /// the override, then the classification table, then 500.
    pub fn code(&self) -> StatusCode {
        if is_not_found(self.origin()) {
            return StatusCode::NOT_FOUND;
        }
        if let Some(status) = self.status_override {
            return status;
        }
        classify(self.origin()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Client-facing message.
    ///
    /// Validation failures are rendered field by field; anything else uses
    /// the origin's display text.
    pub fn message(&self) -> String {
        match self.origin.downcast_ref::<ValidationErrors>() {
            Some(errors) => errors.message(),
            None => self.origin.to_string(),
        }
    }

    /// Full detail for logs: the origin's display text and every source.
    pub fn detail(&self) -> String {
        let mut detail = format!("{:?}", self.origin);
        let mut source = self.origin.source();
        while let Some(cause) = source {
            detail.push_str(&format!("; caused by: {cause}"));
            source = cause.source();
        }
        detail
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.origin, f)
    }
}

impl ResponseError for ErrorEnvelope {
    fn status_code(&self) -> StatusCode {
        self.code()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.code();
        HttpResponse::build(status).json(ErrorBody {
            code: status.as_u16(),
            message: self.message(),
            req_id: String::new(),
        })
    }
}

/// Known failure category and its status.
struct Classification {
    matches: fn(&(dyn StdError + 'static)) -> bool,
    status: StatusCode,
}

const CLASSIFICATIONS: &[Classification] = &[
    Classification {
        matches: is_malformed_json,
        status: StatusCode::BAD_REQUEST,
    },
    Classification {
        matches: is::<JsonPayloadError>,
        status: StatusCode::BAD_REQUEST,
    },
    Classification {
        matches: is::<QueryPayloadError>,
        status: StatusCode::BAD_REQUEST,
    },
    Classification {
        matches: is::<pagination::InvalidQuery>,
        status: StatusCode::BAD_REQUEST,
    },
    Classification {
        matches: is::<ValidationErrors>,
        status: StatusCode::BAD_REQUEST,
    },
];

fn is<T: StdError + 'static>(err: &(dyn StdError + 'static)) -> bool {
    err.is::<T>()
}

fn is_malformed_json(err: &(dyn StdError + 'static)) -> bool {
    err.downcast_ref::<serde_json::Error>()
        .is_some_and(|json| !json.is_io())
}

/// Status for a failure category listed in the classification table.
pub fn classify(err: &(dyn StdError + 'static)) -> Option<StatusCode> {
    CLASSIFICATIONS
        .iter()
        .find(|entry| (entry.matches)(err))
        .map(|entry| entry.status)
}

/// Whether the persistence not-found sentinel appears in `err`'s chain.
pub fn is_not_found(err: &(dyn StdError + 'static)) -> bool {
    std::iter::successors(Some(err), |cause: &&(dyn StdError + 'static)| {
        (*cause).source()
    })
    .any(|cause| {
        matches!(
            cause.downcast_ref::<PersistenceError>(),
            Some(PersistenceError::NotFound)
        )
    })
}

/// Wrap the error half of a `Result` into an [`ErrorEnvelope`].
///
/// The recorded location is the line calling `wrap_err`.
pub trait WrapErr<T> {
    /// Wrap with table classification.
    ///
    /// # Errors
    ///
    /// Returns the wrapped envelope when `self` is `Err`.
    fn wrap_err(self) -> ApiResult<T>;

    /// Wrap with an explicit status.
    ///
    /// # Errors
    ///
    /// Returns the wrapped envelope when `self` is `Err`.
    fn wrap_err_as(self, status: StatusCode) -> ApiResult<T>;
}

impl<T, E> WrapErr<T> for Result<T, E>
where
    E: Into<Origin>,
{
    #[track_caller]
    fn wrap_err(self) -> ApiResult<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(ErrorEnvelope::wrap(err)),
        }
    }

    #[track_caller]
    fn wrap_err_as(self, status: StatusCode) -> ApiResult<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(ErrorEnvelope::wrap_as(err, status)),
        }
    }
}

/// Ordered list of envelopes pushed during one request.
#[derive(Debug, Default)]
pub struct RequestErrors(Vec<ErrorEnvelope>);

impl RequestErrors {
    /// Append `envelope` to the request's list.
    pub fn push(req: &HttpRequest, envelope: ErrorEnvelope) {
        let mut extensions = req.extensions_mut();
        if let Some(errors) = extensions.get_mut::<Self>() {
            errors.0.push(envelope);
        } else {
            extensions.insert(Self(vec![envelope]));
        }
    }

    /// Remove and return every pushed envelope, oldest first.
    pub fn take(req: &HttpRequest) -> Vec<ErrorEnvelope> {
        req.extensions_mut()
            .remove::<Self>()
            .map(|errors| errors.0)
            .unwrap_or_default()
    }
}

/// Extractor letting a handler record failures without returning.
///
/// Recorded envelopes are translated ahead of a returned error.
pub struct ErrorSink {
    req: HttpRequest,
}

impl ErrorSink {
    /// Wrap and record `err`.
    #[track_caller]
    pub fn push(&self, err: impl Into<Origin>) {
        RequestErrors::push(&self.req, ErrorEnvelope::wrap(err));
    }

    /// Wrap and record `err` with an explicit status.
    #[track_caller]
    pub fn push_as(&self, err: impl Into<Origin>, status: StatusCode) {
        RequestErrors::push(&self.req, ErrorEnvelope::wrap_as(err, status));
    }
}

impl FromRequest for ErrorSink {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self { req: req.clone() }))
    }
}

#[cfg(test)]
mod tests;
