//! Common test utilities for integration tests
//!
//! Tests need a reachable PostgreSQL named by `DATABASE_URL`. Every helper
//! creates rows with unique emails so tests can share one database and run
//! in parallel.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use sqlx::PgPool;
use storefront_api::{
    app::{build_router, AppState},
    config::Config,
};
use storefront_shared::{
    auth::{
        jwt::{create_token, Claims},
        password::hash_password,
    },
    db::migrations::run_migrations,
    models::user::{CreateUser, User},
};
use tower::ServiceExt;
use uuid::Uuid;

/// Password given to every user created through [`TestContext::create_user`]
pub const TEST_PASSWORD: &str = "Secret123!";

const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context with a migrated database and a ready router
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(TEST_JWT_SECRET.to_string()),
            "DATABASE_URL" => std::env::var("DATABASE_URL").ok(),
            _ => None,
        })?;

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        let app = build_router(AppState::new(db.clone(), config.clone()));

        Ok(Self { db, app, config })
    }

    /// Unique email address for this test run
    pub fn unique_email(prefix: &str) -> String {
        format!("{}-{}@example.com", prefix, Uuid::new_v4())
    }

    /// Creates a user holding `roles`, with password [`TEST_PASSWORD`]
    pub async fn create_user(&self, roles: &[&str]) -> anyhow::Result<User> {
        let user = User::create_with_roles(
            &self.db,
            CreateUser {
                email: Self::unique_email("user"),
                password_hash: hash_password(TEST_PASSWORD)?,
                first_name: Some("Test".to_string()),
                last_name: None,
            },
            roles,
        )
        .await?;

        Ok(user)
    }

    /// Signs a token for `user` carrying exactly `roles`
    pub fn token_for(&self, user: &User, roles: &[&str]) -> String {
        self.token_with_lifetime(user, roles, self.config.jwt.lifetime())
    }

    pub fn token_with_lifetime(
        &self,
        user: &User,
        roles: &[&str],
        lifetime: chrono::Duration,
    ) -> String {
        let claims = Claims::new(
            user.id,
            user.email.clone(),
            roles.iter().map(|r| r.to_string()).collect(),
            lifetime,
        );
        create_token(&claims, &self.config.jwt.secret).unwrap()
    }

    /// Sends one request through the router
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.app.clone().oneshot(request).await.unwrap()
    }
}

/// Reads a response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
