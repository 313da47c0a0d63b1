//! # Storefront API Server
//!
//! Serves the storefront HTTP API: registration and login, the product
//! catalogue, orders, and user administration.
//!
//! ## Usage
//!
//! ```bash
//! # Migrate and serve, seeding demo data into an empty database
//! cargo run -p storefront-api -- serve --seed
//!
//! # Only apply migrations
//! cargo run -p storefront-api -- migrate --create-database
//! ```

use clap::Parser;
use sqlx::PgPool;
use storefront_api::{
    app::{build_router, AppState},
    cli::{Cli, Command},
    config::Config,
};
use storefront_shared::{
    db::{migrations, pool},
    seed,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storefront_api=debug,storefront_shared=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing::info!(
        "Storefront API v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    match cli.command() {
        Command::Serve { seed } => serve(config, seed).await,
        Command::Migrate { create_database } => migrate(&config, create_database).await,
        Command::Seed => {
            let db = connect(&config).await?;
            let report = seed::bootstrap(&db).await?;
            tracing::info!(?report, "Seeding complete");
            pool::close_pool(db).await;
            Ok(())
        }
    }
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let mut db_config = pool::DatabaseConfig::new(config.database.url.clone());
    db_config.max_connections = config.database.max_connections;
    db_config.min_connections = db_config.min_connections.min(db_config.max_connections);

    Ok(pool::create_pool(db_config).await?)
}

async fn migrate(config: &Config, create_database: bool) -> anyhow::Result<()> {
    if create_database {
        migrations::ensure_database_exists(&config.database.url).await?;
    }

    let db = connect(config).await?;
    migrations::run_migrations(&db).await?;

    let status = migrations::migration_status(&db).await?;
    tracing::info!(
        applied = status.applied,
        available = status.available,
        latest_version = ?status.latest_version,
        "Schema is up to date"
    );

    pool::close_pool(db).await;
    Ok(())
}

async fn serve(config: Config, seed_first: bool) -> anyhow::Result<()> {
    let db = connect(&config).await?;
    migrations::run_migrations(&db).await?;

    if seed_first {
        match seed::bootstrap(&db).await {
            Ok(report) => tracing::info!(?report, "Seeding complete"),
            Err(e) => tracing::error!(error = %e, "Seeding failed, continuing without demo data"),
        }
    }

    let addr = config.bind_address();
    let app = build_router(AppState::new(db.clone(), config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, closing database pool");
    pool::close_pool(db).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
