//! Async connection pool for Diesel PostgreSQL connections.
//!
//! Wraps `diesel-async` and `bb8`. Checkout failures surface as [`PoolError`]
//! and are mapped to connection errors by the repositories.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

/// Errors that can occur during pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Failed to check out a connection from the pool.
    #[error("failed to get connection from pool: {message}")]
    Checkout { message: String },

    /// Failed to build the connection pool.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    /// Create a checkout error with the given message.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    /// Create a build error with the given message.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Pool sizing and checkout limits.
///
/// # Example
///
/// ```
/// use account_service::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://accounts@localhost/accounts").with_max_size(25);
/// assert_eq!(config.max_size(), 25);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Configuration with 10 connections and a 30 second checkout timeout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 10,
            connection_timeout: Duration::from_secs(30),
        }
    }

    /// Set the maximum number of open connections.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the connection checkout timeout.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Database URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Maximum number of open connections.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Async connection pool for PostgreSQL via Diesel.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool; no connection is opened until first checkout.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Build` if the pool cannot be constructed.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;

        Ok(Self { inner: pool })
    }

    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Checkout` if a connection cannot be obtained within
    /// the configured timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_service_sizing() {
        let config = PoolConfig::new("postgres://localhost/accounts");

        assert_eq!(config.database_url(), "postgres://localhost/accounts");
        assert_eq!(config.max_size(), 10);
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
    }

    #[rstest]
    #[case(1)]
    #[case(64)]
    fn max_size_is_configurable(#[case] size: u32) {
        let config = PoolConfig::new("postgres://localhost/accounts")
            .with_max_size(size)
            .with_connection_timeout(Duration::from_secs(5));

        assert_eq!(config.max_size(), size);
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
    }
}
