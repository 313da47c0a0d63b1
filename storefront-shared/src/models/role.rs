/// Role model and user-role membership
///
/// Roles are named permission groups (`Admin`, `User`). A user holds any
/// number of roles through the `user_roles` join table; role names are what
/// ends up in a user's bearer token.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE roles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(64) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT roles_name_key UNIQUE (name)
/// );
///
/// CREATE TABLE user_roles (
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role_id UUID NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
///     PRIMARY KEY (user_id, role_id)
/// );
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Named role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    /// Role ID
    pub id: Uuid,

    /// Unique, case-sensitive role name
    pub name: String,

    /// When the role was created
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Returns the role with this name, creating it if needed
    pub async fn ensure_exists(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(pool)
            .await?;

        sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles WHERE name = $1")
            .bind(name)
            .fetch_one(pool)
            .await
    }

    /// Finds a role by exact name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Looks up several roles at once
    ///
    /// Names with no matching role are returned in the second element so the
    /// caller can report them.
    pub async fn find_many(
        pool: &PgPool,
        names: &[String],
    ) -> Result<(Vec<Self>, Vec<String>), sqlx::Error> {
        let found = sqlx::query_as::<_, Role>(
            "SELECT id, name, created_at FROM roles WHERE name = ANY($1) ORDER BY name",
        )
        .bind(names)
        .fetch_all(pool)
        .await?;

        let mut missing: Vec<String> = names
            .iter()
            .filter(|n| !found.iter().any(|r| &r.name == *n))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();

        Ok((found, missing))
    }

    /// Role names currently held by a user, sorted
    pub async fn names_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Role names for several users in one query
    ///
    /// Users without roles are absent from the map.
    pub async fn names_for_users(
        pool: &PgPool,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<String>>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT ur.user_id, r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ANY($1)
            ORDER BY ur.user_id, r.name
            "#,
        )
        .bind(user_ids)
        .fetch_all(pool)
        .await?;

        let mut map: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (user_id, name) in rows {
            map.entry(user_id).or_default().push(name);
        }
        Ok(map)
    }

    /// Grants this role to a user
    ///
    /// # Returns
    ///
    /// False if the user already held it
    pub async fn add_to_user(&self, pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(self.id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revokes this role from a user
    pub async fn remove_from_user(
        &self,
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(self.id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces a user's role set in one transaction
    ///
    /// Afterwards the user holds exactly `role_ids`. An empty slice strips
    /// every role.
    pub async fn replace_for_user(
        pool: &PgPool,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if !role_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO user_roles (user_id, role_id)
                SELECT $1, UNNEST($2::uuid[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(role_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }
}
