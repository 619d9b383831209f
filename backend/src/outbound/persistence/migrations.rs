//! Embedded schema migrations, applied by `--syncdb`.

use diesel::pg::PgConnection;
use diesel::{Connection, ConnectionError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Migrations from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failures while synchronising the schema.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The database could not be reached.
    #[error("failed to connect for migrations: {0}")]
    Connect(#[from] ConnectionError),
    /// A migration failed to apply.
    #[error("failed to apply migrations: {0}")]
    Apply(String),
}

/// Apply every pending migration, returning the applied versions.
///
/// Blocking; call before the server starts.
///
/// # Errors
///
/// Returns [`MigrationError`] when connecting or applying fails.
pub fn run_pending(database_url: &str) -> Result<Vec<String>, MigrationError> {
    let mut conn = PgConnection::establish(database_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply(err.to_string()))?;
    Ok(applied.iter().map(ToString::to_string).collect())
}
