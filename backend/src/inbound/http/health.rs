//! Health check endpoint.
//!
//! Answers without touching storage or the config service so load balancers
//! see the process itself.

use actix_web::web;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned by the health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthMessage {
    /// Always `ok`.
    #[schema(example = "ok")]
    pub message: String,
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/v1/health/check",
    tags = ["health"],
    responses((status = 200, description = "Process is serving", body = HealthMessage))
)]
pub async fn check() -> web::Json<HealthMessage> {
    web::Json(HealthMessage {
        message: "ok".to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn reports_ok() {
        let app = test::init_service(App::new().route("/v1/health/check", web::get().to(check)))
            .await;
        let req = test::TestRequest::get().uri("/v1/health/check").to_request();
        let body: HealthMessage = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.message, "ok");
    }
}
