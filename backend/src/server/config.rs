//! HTTP server configuration object.

use std::net::SocketAddr;
use std::time::Duration;

use account_service::outbound::persistence::DbPool;
use account_service::settings::ConfigServiceSettings;

/// Grace period for in-flight requests after a stop signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Everything needed to start serving.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) config_service: ConfigServiceSettings,
    pub(crate) shutdown_grace: Duration,
}

impl ServerConfig {
    /// Configuration with the default shutdown grace period.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        db_pool: DbPool,
        config_service: ConfigServiceSettings,
    ) -> Self {
        Self {
            bind_addr,
            db_pool,
            config_service,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }
}
