/// Schema migrations
///
/// SQL files live in `migrations/` at the workspace root and are embedded in
/// the binary at compile time, so a deployed server needs no files on disk.
///
/// # Example
///
/// ```no_run
/// use storefront_shared::db::pool::{create_pool, DatabaseConfig};
/// use storefront_shared::db::migrations::{run_migrations, migration_status};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new("postgres://localhost/storefront")).await?;
/// run_migrations(&pool).await?;
///
/// let status = migration_status(&pool).await?;
/// assert!(status.is_up_to_date());
/// # Ok(())
/// # }
/// ```

use sqlx::{
    migrate::{MigrateDatabase, MigrateError, Migrator},
    postgres::PgPool,
    Postgres,
};
use tracing::{debug, info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applied versus embedded migrations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Successfully applied migrations
    pub applied: usize,

    /// Migrations compiled into this binary
    pub available: usize,

    /// Highest applied version
    pub latest_version: Option<i64>,
}

impl MigrationStatus {
    /// True when every embedded migration has been applied
    pub fn is_up_to_date(&self) -> bool {
        self.applied >= self.available
    }

    /// Embedded migrations not yet applied
    pub fn pending(&self) -> usize {
        self.available.saturating_sub(self.applied)
    }
}

/// Applies all pending migrations
///
/// Each migration runs in its own transaction; a failing one is rolled back
/// and reported.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(available = MIGRATOR.iter().count(), "Running database migrations");

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("Database migrations complete");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Reports how far the database schema has been migrated
pub async fn migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let available = MIGRATOR.iter().filter(|m| m.migration_type.is_up_migration()).count();

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied: 0,
            available,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    Ok(MigrationStatus {
        applied: usize::try_from(count).unwrap_or(0),
        available,
        latest_version,
    })
}

/// Creates the database named in `database_url` if it is missing
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    } else {
        debug!("Database already exists");
    }

    Ok(())
}
