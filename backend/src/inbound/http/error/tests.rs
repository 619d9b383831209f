//! Tests for envelope classification and wrapping.

use super::*;
use crate::domain::validation::{FieldViolation, Rule};
use crate::domain::AccountError;
use actix_web::test::TestRequest;
use rstest::rstest;
use std::io;

fn io_error() -> io::Error {
    io::Error::other("disk on fire")
}

#[rstest]
#[case(None, StatusCode::NOT_FOUND)]
#[case(Some(StatusCode::INTERNAL_SERVER_ERROR), StatusCode::NOT_FOUND)]
#[case(Some(StatusCode::BAD_REQUEST), StatusCode::NOT_FOUND)]
fn not_found_sentinel_beats_override(
    #[case] status_override: Option<StatusCode>,
    #[case] expected: StatusCode,
) {
    let envelope = match status_override {
        Some(status) => ErrorEnvelope::wrap_as(PersistenceError::not_found(), status),
        None => ErrorEnvelope::wrap(PersistenceError::not_found()),
    };
    assert_eq!(envelope.code(), expected);
}

#[test]
fn not_found_is_detected_through_sources() {
    let envelope = ErrorEnvelope::wrap_as(
        AccountError::from(PersistenceError::not_found()),
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    assert_eq!(envelope.code(), StatusCode::NOT_FOUND);
}

#[test]
fn override_beats_classification_table() {
    let json = serde_json::from_str::<serde_json::Value>("{").expect_err("malformed");
    let envelope = ErrorEnvelope::wrap_as(json, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(envelope.code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[rstest]
#[case::malformed_json(ErrorEnvelope::wrap(
    serde_json::from_str::<serde_json::Value>("{\"a\":").expect_err("malformed")
))]
#[case::wrong_type(ErrorEnvelope::wrap(
    serde_json::from_str::<u8>("\"x\"").expect_err("type mismatch")
))]
#[case::validation(ErrorEnvelope::wrap(
    ValidationErrors::from_violations(vec![FieldViolation::new("env", Rule::Required, "")])
        .expect("non-empty")
))]
#[case::pagination(ErrorEnvelope::wrap(pagination::InvalidQuery::PageSize))]
fn table_maps_client_failures_to_bad_request(#[case] envelope: ErrorEnvelope) {
    assert_eq!(envelope.code(), StatusCode::BAD_REQUEST);
}

#[test]
fn unknown_failures_default_to_internal_error() {
    assert_eq!(
        ErrorEnvelope::wrap(io_error()).code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn wrap_records_caller_location() {
    let line = line!() + 1;
    let envelope = ErrorEnvelope::wrap(io_error());
    assert_eq!(envelope.location().line(), line);
    assert!(envelope.location().file().ends_with("tests.rs"));
}

#[test]
fn wrap_err_records_call_site_not_helper() {
    let failing: Result<(), io::Error> = Err(io_error());
    let line = line!() + 1;
    let envelope = failing.wrap_err().expect_err("wrapped");
    assert_eq!(envelope.location().line(), line);
}

#[test]
fn validation_message_is_formatted() {
    let errors = ValidationErrors::from_violations(vec![
        FieldViolation::new("AppId", Rule::Required, ""),
        FieldViolation::new("Env", Rule::Required, ""),
    ])
    .expect("non-empty");
    let envelope = ErrorEnvelope::wrap(errors);
    assert_eq!(envelope.message(), "'app_id' is required, 'env' is required");
}

#[test]
fn detail_includes_sources() {
    let envelope = ErrorEnvelope::wrap(AccountError::from(PersistenceError::query("syntax")));
    let detail = envelope.detail();
    assert!(detail.contains("caused by: persistence query failed: syntax"));
}

#[test]
fn request_errors_keep_push_order() {
    let req = TestRequest::default().to_http_request();
    RequestErrors::push(&req, ErrorEnvelope::wrap("first"));
    RequestErrors::push(&req, ErrorEnvelope::wrap("second"));

    let taken: Vec<String> = RequestErrors::take(&req)
        .iter()
        .map(ErrorEnvelope::message)
        .collect();

    assert_eq!(taken, vec!["first".to_owned(), "second".to_owned()]);
    assert!(RequestErrors::take(&req).is_empty());
}

#[test]
fn response_error_renders_error_body() {
    let envelope = ErrorEnvelope::wrap_as("gone", StatusCode::GONE);
    let response = envelope.error_response();
    assert_eq!(response.status(), StatusCode::GONE);
}
