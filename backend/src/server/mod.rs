//! Server construction: adapters, shared state and the HTTP listener.

mod config;

pub use config::ServerConfig;

use std::io;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{HttpServer, web};

use account_service::domain::ports::ErrorReporter;
use account_service::domain::{ActionHooks, AuditTrail};
use account_service::inbound::http::state::HttpState;
use account_service::inbound::http::{AppDependencies, RouteTable, build_app};
use account_service::outbound::config_service::{HttpNamespaceLookup, RestClient};
use account_service::outbound::error_reporting::TracingErrorReporter;
use account_service::outbound::persistence::{DieselAccountRepository, DieselActionRepository};

/// Wire the adapters into the per-worker app dependencies.
///
/// # Errors
///
/// Returns [`io::Error`] when the REST client, the config-service endpoint
/// or the route table cannot be built.
fn build_dependencies(config: &ServerConfig) -> io::Result<AppDependencies> {
    let rest = RestClient::new().map_err(io::Error::other)?;
    let namespaces =
        HttpNamespaceLookup::new(rest, &config.config_service).map_err(io::Error::other)?;
    let http_state = HttpState::new(
        Arc::new(DieselAccountRepository::new(config.db_pool.clone())),
        Arc::new(namespaces),
    );
    let audit = AuditTrail::new(
        Arc::new(DieselActionRepository::new(config.db_pool.clone())),
        ActionHooks::standard(),
    );
    let reporter: Arc<dyn ErrorReporter> = Arc::new(TracingErrorReporter);

    Ok(AppDependencies {
        http_state: web::Data::new(http_state),
        audit: web::Data::new(audit),
        reporter: web::Data::from(reporter),
        routes: RouteTable::standard().map_err(io::Error::other)?,
    })
}

/// Construct the Actix HTTP server.
///
/// In-flight requests get the configured grace period to finish once a stop
/// signal arrives; remaining connections are then closed.
///
/// # Errors
///
/// Propagates [`io::Error`] when wiring fails or the socket cannot be bound.
pub fn create_server(config: ServerConfig) -> io::Result<Server> {
    let deps = build_dependencies(&config)?;
    let server = HttpServer::new(move || build_app(deps.clone()))
        .shutdown_timeout(config.shutdown_grace.as_secs())
        .bind(config.bind_addr)?
        .run();
    Ok(server)
}
