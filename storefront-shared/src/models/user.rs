/// User model and database operations
///
/// Users log in with their email address. Passwords are stored as Argon2id
/// hashes only. Role membership lives in `user_roles` (see [`super::role`]).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     first_name VARCHAR(100),
///     last_name VARCHAR(100),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use storefront_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create_with_roles(
///     &pool,
///     CreateUser {
///         email: "shopper@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///         first_name: Some("Sam".to_string()),
///         last_name: None,
///     },
///     &["User"],
/// )
/// .await?;
///
/// let found = User::find_by_email(&pool, "SHOPPER@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, created_at, updated_at, last_login_at";

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Login email (case-insensitive via CITEXT, unique)
    pub email: String,

    /// Argon2id password hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Optional first name
    pub first_name: Option<String>,

    /// Optional last name
    pub last_name: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Optional first name
    pub first_name: Option<String>,

    /// Optional last name
    pub last_name: Option<String>,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written. `first_name`/`last_name` use
/// `Some(None)` to clear the value.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// New email address
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New first name
    pub first_name: Option<Option<String>>,

    /// New last name
    pub last_name: Option<Option<String>>,
}

impl UpdateUser {
    /// True when nothing would be written
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }
}

impl User {
    /// Creates a user and links the given roles in one transaction
    ///
    /// Missing roles are created on the fly, so the default role needs no
    /// prior seeding.
    ///
    /// # Errors
    ///
    /// Returns a unique violation on `users_email_key` if the email is taken.
    pub async fn create_with_roles(
        pool: &PgPool,
        data: CreateUser,
        roles: &[&str],
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.first_name)
        .bind(data.last_name)
        .fetch_one(&mut *tx)
        .await?;

        if !roles.is_empty() {
            let names: Vec<String> = roles.iter().map(|r| r.to_string()).collect();

            sqlx::query(
                r#"
                INSERT INTO roles (name)
                SELECT UNNEST($1::varchar[])
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(&names)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO user_roles (user_id, role_id)
                SELECT $1, id FROM roles WHERE name = ANY($2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(user.id)
            .bind(&names)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1::citext"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether an email is already registered
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1::citext)")
            .bind(email)
            .fetch_one(pool)
            .await
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` are written; `updated_at` is always bumped.
    ///
    /// # Returns
    ///
    /// The updated user, or None if no row has this ID
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.first_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", first_name = ${}", bind_count));
        }
        if data.last_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_name = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user by ID
    ///
    /// Role links, stored claims and the user's orders cascade.
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records a successful login
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users, oldest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY created_at ASC, email ASC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: Option<&str>, last: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let json = serde_json::to_value(user(Some("Sam"), None)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@b.com");
    }

    #[test]
    fn test_update_user_default_is_empty() {
        assert!(UpdateUser::default().is_empty());
        assert!(!UpdateUser {
            first_name: Some(None),
            ..Default::default()
        }
        .is_empty());
    }
}
