/// Extra per-user claims
///
/// A stored claim is a free-form `(type, value)` pair copied into the bearer
/// token at login under `ext`. Claims never grant roles.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Stored claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserClaim {
    pub id: Uuid,
    pub user_id: Uuid,
    pub claim_type: String,
    pub claim_value: String,
}

impl UserClaim {
    /// Stores a claim for a user
    pub async fn add(
        pool: &PgPool,
        user_id: Uuid,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserClaim>(
            r#"
            INSERT INTO user_claims (user_id, claim_type, claim_value)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, claim_type, claim_value
            "#,
        )
        .bind(user_id)
        .bind(claim_type)
        .bind(claim_value)
        .fetch_one(pool)
        .await
    }

    /// All claims of a user, grouped by type
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserClaim>(
            r#"
            SELECT id, user_id, claim_type, claim_value
            FROM user_claims
            WHERE user_id = $1
            ORDER BY claim_type, claim_value
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// `(type, value)` pairs ready for [`crate::auth::jwt::Claims::with_extra`]
    pub fn into_pair(self) -> (String, String) {
        (self.claim_type, self.claim_value)
    }
}
