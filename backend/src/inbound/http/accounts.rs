//! Account API handlers.
//!
//! ```text
//! GET  /v1/accounts?page=2&page_size=10&is_pagination=1
//! POST /v1/accounts {"app_id":"billing","env":"dev","cluster_name":"default","namespace_name":"application"}
//! ```

use actix_web::{HttpResponse, web};
use pagination::Paged;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{Account, NamespaceRef, Validate};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::{ErrorBody, WrapErr};
use crate::inbound::http::schemas::AccountListSchema;
use crate::inbound::http::state::HttpState;
use crate::middleware::Paginated;

/// Request body for `POST /v1/accounts`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AddAccountRequest {
    /// Application identifier at the config service.
    #[schema(example = "billing")]
    #[serde(default)]
    pub app_id: String,
    /// Deployment environment.
    #[schema(example = "dev")]
    #[serde(default)]
    pub env: String,
    /// Cluster inside the environment.
    #[schema(example = "default")]
    #[serde(default)]
    pub cluster_name: String,
    /// Namespace inside the cluster.
    #[schema(example = "application")]
    #[serde(default)]
    pub namespace_name: String,
}

impl From<AddAccountRequest> for NamespaceRef {
    fn from(value: AddAccountRequest) -> Self {
        Self {
            app_id: value.app_id,
            env: value.env,
            cluster_name: value.cluster_name,
            namespace_name: value.namespace_name,
        }
    }
}

/// List accounts, one page at a time.
#[utoipa::path(
    get,
    path = "/v1/accounts",
    params(
        ("page" = Option<i64>, Query, description = "1-based page, default 1"),
        ("page_size" = Option<i64>, Query, description = "Rows per page, default 20, capped at 200"),
        ("is_pagination" = Option<bool>, Query, description = "Set false to list everything")
    ),
    responses(
        (status = 200, description = "Accounts", body = AccountListSchema),
        (status = 400, description = "Invalid pagination query", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    tags = ["accounts"],
    operation_id = "listAccounts"
)]
pub async fn list_accounts(
    Paginated(params): Paginated,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Paged<Account>>> {
    let page = state.accounts.list(params.window()).await.wrap_err()?;
    Ok(web::Json(Paged::new(&params, page.count, page.accounts)))
}

/// Bind a config-service namespace to a new account.
///
/// The body is read raw so malformed JSON reaches the error pipeline as a
/// classified failure rather than an extractor rejection.
#[utoipa::path(
    post,
    path = "/v1/accounts",
    request_body = AddAccountRequest,
    responses(
        (status = 200, description = "Account stored, empty JSON object"),
        (status = 400, description = "Malformed or invalid body", body = ErrorBody),
        (status = 500, description = "Config service or storage failure", body = ErrorBody)
    ),
    tags = ["accounts"],
    operation_id = "addAccount"
)]
pub async fn add_account(body: web::Bytes, state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let request: AddAccountRequest = serde_json::from_slice(&body).wrap_err()?;
    let namespace = NamespaceRef::from(request);
    namespace.validate().wrap_err()?;
    state.accounts.add(&namespace).await.wrap_err()?;
    Ok(HttpResponse::Ok().json(json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::NamespaceLookupError;
    use crate::middleware::{ErrorTranslation, Pagination};
    use crate::test_support::{InMemoryAccountRepository, StubNamespaceLookup};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;

    fn namespace(app_id: &str) -> NamespaceRef {
        NamespaceRef {
            app_id: app_id.into(),
            env: "dev".into(),
            cluster_name: "default".into(),
            namespace_name: "application".into(),
        }
    }

    fn state(repo: Arc<InMemoryAccountRepository>, lookup: StubNamespaceLookup) -> HttpState {
        HttpState::new(repo, Arc::new(lookup))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .route(
                        "/v1/accounts",
                        web::get()
                            .to(list_accounts)
                            .wrap(Pagination)
                            .wrap(ErrorTranslation),
                    )
                    .route(
                        "/v1/accounts",
                        web::post().to(add_account).wrap(ErrorTranslation),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn lists_requested_window() {
        let repo = Arc::new(InMemoryAccountRepository::default());
        for index in 1..=5 {
            repo.insert(namespace(&format!("app-{index}")));
        }
        let app = app!(state(repo, StubNamespaceLookup::found()));

        let req = test::TestRequest::get()
            .uri("/v1/accounts?page=2&page_size=2")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["count"], 5);
        assert_eq!(body["page"], 2);
        assert_eq!(body["page_size"], 2);
        let apps: Vec<&str> = body["result"]
            .as_array()
            .expect("result array")
            .iter()
            .filter_map(|account| account["app_id"].as_str())
            .collect();
        assert_eq!(apps, vec!["app-3", "app-4"]);
    }

    #[actix_web::test]
    async fn disabled_pagination_lists_everything() {
        let repo = Arc::new(InMemoryAccountRepository::default());
        for index in 1..=3 {
            repo.insert(namespace(&format!("app-{index}")));
        }
        let app = app!(state(repo, StubNamespaceLookup::found()));

        let req = test::TestRequest::get()
            .uri("/v1/accounts?is_pagination=false&page=9")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["page"], -1);
        assert_eq!(body["result"].as_array().map(Vec::len), Some(3));
    }

    #[actix_web::test]
    async fn adds_account_after_lookup() {
        let repo = Arc::new(InMemoryAccountRepository::default());
        let app = app!(state(repo.clone(), StubNamespaceLookup::found()));

        let req = test::TestRequest::post()
            .uri("/v1/accounts")
            .set_json(json!({
                "app_id": "billing",
                "env": "dev",
                "cluster_name": "default",
                "namespace_name": "application"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({}));
        assert_eq!(repo.len(), 1);
    }

    #[rstest]
    #[case::malformed("{\"app_id\":", StatusCode::BAD_REQUEST, None)]
    #[case::missing_fields(
        "{\"app_id\":\"billing\"}",
        StatusCode::BAD_REQUEST,
        Some("'env' is required, 'cluster_name' is required, 'namespace_name' is required")
    )]
    #[actix_web::test]
    async fn rejects_bad_bodies(
        #[case] payload: &'static str,
        #[case] status: StatusCode,
        #[case] message: Option<&str>,
    ) {
        let repo = Arc::new(InMemoryAccountRepository::default());
        let app = app!(state(repo.clone(), StubNamespaceLookup::found()));

        let req = test::TestRequest::post()
            .uri("/v1/accounts")
            .insert_header(("content-type", "application/json"))
            .set_payload(payload)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), status);
        let body: ErrorBody = test::read_body_json(res).await;
        assert_eq!(body.code, status.as_u16());
        if let Some(expected) = message {
            assert_eq!(body.message, expected);
        }
        assert_eq!(repo.len(), 0);
    }

    #[actix_web::test]
    async fn failed_lookup_is_a_server_error() {
        let repo = Arc::new(InMemoryAccountRepository::default());
        let lookup = StubNamespaceLookup::failing(NamespaceLookupError::status(
            404_u16,
            "Invalid http 404 when rest http://apollo/: missing",
        ));
        let app = app!(state(repo.clone(), lookup));

        let req = test::TestRequest::post()
            .uri("/v1/accounts")
            .set_json(json!({
                "app_id": "billing",
                "env": "dev",
                "cluster_name": "default",
                "namespace_name": "ghost"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = test::read_body_json(res).await;
        assert!(body.message.starts_with("namespace lookup failed: Invalid http 404"));
        assert_eq!(repo.len(), 0);
    }
}
