//! Pipeline composer: orders the middleware stages and mounts the routes.
//!
//! From the outside in, every request passes [`AccessLog`], [`Recover`],
//! then the `/v1` scope's [`ErrorTranslation`]. Audited routes add
//! [`Action`], [`ResponseCapture`] and their own [`ErrorTranslation`] so the
//! audit record sees the translated response. The list route adds
//! [`Pagination`] in front of its handler.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, Route, web};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::doc::ApiDoc;
use crate::domain::AuditTrail;
use crate::domain::audit::ADD_ACCOUNT;
use crate::domain::ports::ErrorReporter;
use crate::inbound::http::accounts::{add_account, list_accounts};
use crate::inbound::http::health::check;
use crate::inbound::http::state::HttpState;
use crate::middleware::{
    AccessLog, Action, ErrorTranslation, Pagination, Recover, ResponseCapture,
};

/// Version prefix shared by every API route.
pub const API_PREFIX: &str = "/v1";
/// Swagger UI mount point.
pub const SWAGGER_PATH: &str = "/v1/swagger/";
/// Generated OpenAPI document.
pub const OPENAPI_PATH: &str = "/v1/swagger/openapi.json";

/// A scope prefix was registered twice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("route prefix {prefix} is registered twice")]
pub struct DuplicatePrefix {
    /// Offending prefix.
    pub prefix: &'static str,
}

/// Mounts the routes below one scope prefix.
pub type Mount = fn(&mut web::ServiceConfig);

#[derive(Clone, Copy)]
struct RouteGroup {
    prefix: &'static str,
    mount: Mount,
}

/// Registry of scope prefixes below [`API_PREFIX`].
///
/// Built once at startup, then cloned into every worker's app factory.
/// Registration rejects duplicates so two groups can never shadow each
/// other.
#[derive(Clone, Default)]
pub struct RouteTable {
    groups: Vec<RouteGroup>,
}

impl RouteTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The service's route groups: `/accounts` and `/health`.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicatePrefix`] if a prefix repeats.
    pub fn standard() -> Result<Self, DuplicatePrefix> {
        Self::new()
            .register("/accounts", mount_accounts)?
            .register("/health", mount_health)
    }

    /// Add a group under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicatePrefix`] when `prefix` is already registered.
    pub fn register(mut self, prefix: &'static str, mount: Mount) -> Result<Self, DuplicatePrefix> {
        if self.contains(prefix) {
            return Err(DuplicatePrefix { prefix });
        }
        self.groups.push(RouteGroup { prefix, mount });
        Ok(self)
    }

    /// Whether `prefix` is registered.
    pub fn contains(&self, prefix: &str) -> bool {
        self.groups.iter().any(|group| group.prefix == prefix)
    }

    /// Registered prefixes in registration order.
    pub fn prefixes(&self) -> Vec<&'static str> {
        self.groups.iter().map(|group| group.prefix).collect()
    }

    fn mount(&self, cfg: &mut web::ServiceConfig) {
        for group in &self.groups {
            cfg.service(web::scope(group.prefix).configure(group.mount));
        }
    }
}

/// Compose the audit stages around `route`.
///
/// Translation runs innermost so capture stores the translated response
/// and the action record completes from it.
pub fn audited(route: Route, operation: &'static str) -> Route {
    route
        .wrap(ErrorTranslation)
        .wrap(ResponseCapture)
        .wrap(Action::new(operation))
}

fn mount_accounts(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list_accounts).wrap(Pagination))
        .route("", audited(web::post().to(add_account), ADD_ACCOUNT));
}

fn mount_health(cfg: &mut web::ServiceConfig) {
    cfg.route("/check", web::get().to(check));
}

/// Everything one worker's [`App`] needs.
#[derive(Clone)]
pub struct AppDependencies {
    /// Handler state.
    pub http_state: web::Data<HttpState>,
    /// Audit writer used by [`Action`].
    pub audit: web::Data<AuditTrail>,
    /// Sink for server-side failures.
    pub reporter: web::Data<dyn ErrorReporter>,
    /// Route groups below [`API_PREFIX`].
    pub routes: RouteTable,
}

/// Build the application with the full stage ordering.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        http_state,
        audit,
        reporter,
        routes,
    } = deps;

    let api = web::scope(API_PREFIX)
        .wrap(ErrorTranslation)
        .configure(|cfg| routes.mount(cfg));

    App::new()
        .app_data(http_state)
        .app_data(audit)
        .app_data(reporter)
        .wrap(Recover)
        .wrap(AccessLog)
        .service(
            SwaggerUi::new(format!("{SWAGGER_PATH}{{_:.*}}"))
                .url(OPENAPI_PATH, ApiDoc::openapi()),
        )
        .service(api)
}
