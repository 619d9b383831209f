//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects the account and health paths plus the schema
//! wrappers from [`crate::inbound::http::schemas`]. Swagger UI serves it at
//! `/v1/swagger/`.

use utoipa::OpenApi;

use crate::inbound::http::accounts::AddAccountRequest;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::health::HealthMessage;
use crate::inbound::http::schemas::{AccountListSchema, AccountSchema};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Account service API",
        description = "Accounts bound to config-service namespaces, with audited writes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::accounts::list_accounts,
        crate::inbound::http::accounts::add_account,
        crate::inbound::http::health::check,
    ),
    components(schemas(
        AccountSchema,
        AccountListSchema,
        AddAccountRequest,
        ErrorBody,
        HealthMessage
    )),
    tags(
        (name = "accounts", description = "Account listing and creation"),
        (name = "health", description = "Process health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    const ACCOUNT_SCHEMA_NAME: &str = "crate.domain.Account";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["/v1/accounts", "/v1/health/check"]);
        let accounts = doc.paths.paths.get("/v1/accounts").expect("accounts path");
        assert!(accounts.get.is_some());
        assert!(accounts.post.is_some());
    }

    #[test]
    fn error_body_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error = schemas.get("ErrorBody").expect("ErrorBody schema");
        for field in ["code", "message", "req_id"] {
            assert_object_schema_has_field(error, field);
        }
    }

    #[test]
    fn account_schema_is_registered() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let account = schemas.get(ACCOUNT_SCHEMA_NAME).expect("Account schema");
        assert_object_schema_has_field(account, "app_id");
        assert_object_schema_has_field(account, "created_at");
    }
}
