/// PostgreSQL connection pool
///
/// Every request handler borrows connections from one shared `PgPool`. The
/// pool is verified with a round-trip query before it is handed out.
///
/// # Example
///
/// ```no_run
/// use storefront_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
///
///     let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
///         .fetch_one(&pool)
///         .await?;
///     println!("{} products", n);
///     Ok(())
/// }
/// ```

use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection pool settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Upper bound on open connections
    pub max_connections: u32,

    /// Connections kept warm while idle
    pub min_connections: u32,

    /// How long a request waits for a free connection (seconds)
    pub acquire_timeout_seconds: u64,

    /// Idle connections older than this are closed (seconds)
    pub idle_timeout_seconds: Option<u64>,

    /// Connections are recycled after this long (seconds)
    pub max_lifetime_seconds: Option<u64>,
}

impl DatabaseConfig {
    /// Default settings for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
        }
    }
}

/// Creates the pool and checks that the database answers
///
/// # Errors
///
/// Returns an error if the URL is invalid, the server is unreachable, or the
/// health check fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_seconds = config.acquire_timeout_seconds,
        "Creating database connection pool"
    );

    let mut pool_options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .test_before_acquire(true);

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        pool_options = pool_options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    if let Some(max_lifetime) = config.max_lifetime_seconds {
        pool_options = pool_options.max_lifetime(Duration::from_secs(max_lifetime));
    }

    let pool = pool_options.connect(&config.url).await?;

    health_check(&pool).await?;

    info!("Database connection pool ready");
    Ok(pool)
}

/// Runs `SELECT 1` against the pool
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let (value,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if value == 1 {
        debug!("Database health check passed");
        Ok(())
    } else {
        warn!(value, "Database health check returned unexpected value");
        Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ))
    }
}

/// Snapshot of pool usage, reported by the health endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Connections checked out
    pub active: u32,

    /// Connections open but unused
    pub idle: u32,

    /// All open connections
    pub size: u32,
}

impl PoolStats {
    fn from_counts(size: u32, idle: usize) -> Self {
        let idle = u32::try_from(idle).unwrap_or(u32::MAX).min(size);
        Self {
            active: size - idle,
            idle,
            size,
        }
    }
}

/// Reads current pool usage
pub fn pool_stats(pool: &PgPool) -> PoolStats {
    PoolStats::from_counts(pool.size(), pool.num_idle())
}

/// Closes every connection; call during shutdown
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
}
