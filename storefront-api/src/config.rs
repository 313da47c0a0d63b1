/// Configuration management for the API server
///
/// Values come from the process environment, after an optional `.env` file
/// has been loaded.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `JWT_SECRET`: HMAC signing secret, at least 32 bytes (required)
/// - `JWT_EXPIRATION_HOURS`: Token lifetime (default: 6)
/// - `CORS_ORIGINS`: Comma-separated origins, `*` for any (default: http://localhost:4200)
/// - `APP_ENV`: `production` turns on HSTS (default: development)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use storefront_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use storefront_shared::auth::jwt::{validate_secret, DEFAULT_TOKEN_LIFETIME_HOURS};

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_LIFETIME_HOURS: i64 = 24 * 366;

/// Origin of the bundled Angular storefront in development
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:4200";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in hours
    pub expiration_hours: i64,
}

impl JwtConfig {
    /// Token lifetime as a duration
    pub fn lifetime(&self) -> Duration {
        Duration::hours(self.expiration_hours)
    }
}

impl Config {
    /// Loads configuration from `.env` and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or the JWT secret is too short.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a port number")?;

        let database_url =
            lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let jwt_secret =
            lookup("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        validate_secret(&jwt_secret)?;

        let expiration_hours = match lookup("JWT_EXPIRATION_HOURS") {
            Some(value) => value
                .parse::<i64>()
                .context("JWT_EXPIRATION_HOURS must be an integer")?,
            None => DEFAULT_TOKEN_LIFETIME_HOURS,
        };
        if expiration_hours <= 0 {
            anyhow::bail!("JWT_EXPIRATION_HOURS must be positive");
        }
        if expiration_hours > MAX_TOKEN_LIFETIME_HOURS
            || Duration::try_hours(expiration_hours).is_none()
        {
            anyhow::bail!(
                "JWT_EXPIRATION_HOURS must be at most {}",
                MAX_TOKEN_LIFETIME_HOURS
            );
        }

        let cors_origins = parse_origins(
            &lookup("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
        );

        let production = lookup("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// True when any origin may call the API
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
