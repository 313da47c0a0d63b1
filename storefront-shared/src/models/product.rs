/// Product catalogue model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE products (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(200) NOT NULL CHECK (length(name) > 0),
///     description TEXT,
///     price NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (price >= 0),
///     image_url VARCHAR(512),
///     yield_rating INTEGER NOT NULL DEFAULT 0,
///     specs TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The `yield_rating` column is exposed as `yield` in JSON.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image_url, yield_rating, specs, created_at, updated_at";

/// Catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,

    /// Display name, never empty
    pub name: String,

    pub description: Option<String>,

    /// Unit price, two decimal places, never negative
    pub price: Decimal,

    /// Relative or absolute image path
    pub image_url: Option<String>,

    /// Yield rating shown on the product card
    #[serde(rename = "yield")]
    pub yield_rating: i32,

    /// Free-form technical details
    pub specs: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full set of writable product fields
///
/// Used both for creation and for full replacement on update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub yield_rating: i32,
    pub specs: Option<String>,
}

impl Product {
    /// Inserts a product
    pub async fn create(pool: &PgPool, data: ProductInput) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, description, price, image_url, yield_rating, specs)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.price)
        .bind(data.image_url)
        .bind(data.yield_rating)
        .bind(data.specs)
        .fetch_one(pool)
        .await
    }

    /// Finds a product by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists the whole catalogue, oldest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at ASC, name ASC"
        ))
        .fetch_all(pool)
        .await
    }

    /// Overwrites every writable field
    ///
    /// # Returns
    ///
    /// The updated product, or None if no row has this ID
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: ProductInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, image_url = $5,
                yield_rating = $6, specs = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.price)
        .bind(data.image_url)
        .bind(data.yield_rating)
        .bind(data.specs)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a product
    ///
    /// Fails with a foreign-key violation while any order line references it.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts catalogue entries
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_yield_is_renamed_in_json() {
        let product = Product {
            id: Uuid::new_v4(),
            name: "Anaconda".to_string(),
            description: None,
            price: Decimal::from_str("19.99").unwrap(),
            image_url: Some("assets/images/anaconda.png".to_string()),
            yield_rating: 3,
            specs: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["yield"], 3);
        assert!(json.get("yield_rating").is_none());
        assert_eq!(json["price"], "19.99");
    }
}
