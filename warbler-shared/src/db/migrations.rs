/// Schema migrations
///
/// The SQL files under `warbler-shared/migrations/` are embedded at compile
/// time and applied in timestamp order. Applied versions are recorded in
/// `_sqlx_migrations`, so running them again at every startup is a no-op.

use sqlx::{migrate::MigrateError, postgres::PgPool};
use tracing::{error, info};

/// Applies every pending migration
///
/// # Errors
///
/// Returns the first migration failure; the failing migration is rolled back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    let migrator = sqlx::migrate!("./migrations");
    info!(known = migrator.iter().count(), "Running database migrations");

    migrator.run(pool).await.map_err(|e| {
        error!(error = %e, "Database migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}
