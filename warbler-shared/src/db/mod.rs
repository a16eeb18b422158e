/// PostgreSQL plumbing for the Warbler store
///
/// # Modules
///
/// - [`pool`]: connection pool creation, health check and shutdown
/// - [`migrations`]: embedded schema migrations
/// - [`seed`]: optional demo accounts and tweets for local runs
///
/// Table-level queries live next to their models in [`crate::models`].
///
/// # Example
///
/// ```no_run
/// use warbler_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?, 10)).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

pub mod migrations;
pub mod pool;
pub mod seed;
