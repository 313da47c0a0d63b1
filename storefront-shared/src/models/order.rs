/// Order and order line models
///
/// An order belongs to one user and owns an ordered list of lines. Lines are
/// never written on their own: they are created, replaced and deleted with
/// their order, always inside one transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE orders (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE order_items (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
///     product_id UUID NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
///     quantity INTEGER NOT NULL CHECK (quantity > 0),
///     position INTEGER NOT NULL,
///     UNIQUE (order_id, position)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use storefront_shared::models::order::{Order, OrderDraft, OrderLine};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, product_id: Uuid) -> Result<(), sqlx::Error> {
/// let order = Order::create(
///     &pool,
///     OrderDraft {
///         user_id,
///         items: vec![OrderLine { product_id, quantity: 2 }],
///     },
/// )
/// .await?;
///
/// assert_eq!(order.items.len(), 1);
/// assert!(order.items.iter().all(|item| item.order_id == order.id));
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Order with its lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Lines in the order they were submitted
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

/// Single order line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,

    /// Always at least 1
    pub quantity: i32,
}

/// Line to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Owner plus lines; used for both create and full replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub user_id: Uuid,
    pub items: Vec<OrderLine>,
}

const ORDER_COLUMNS: &str = "id, user_id, created_at, updated_at";

impl Order {
    /// Creates an order and all of its lines atomically
    ///
    /// # Errors
    ///
    /// A foreign-key violation if the owner or any product does not exist;
    /// nothing is written in that case.
    pub async fn create(pool: &PgPool, draft: OrderDraft) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (user_id) VALUES ($1) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(draft.user_id)
        .fetch_one(&mut *tx)
        .await?;

        order.items = insert_items(&mut tx, order.id, &draft.items).await?;

        tx.commit().await?;

        Ok(order)
    }

    /// Finds an order with its lines
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match order {
            Some(mut order) => {
                order.items = sqlx::query_as::<_, OrderItem>(
                    r#"
                    SELECT id, order_id, product_id, quantity
                    FROM order_items
                    WHERE order_id = $1
                    ORDER BY position
                    "#,
                )
                .bind(order.id)
                .fetch_all(pool)
                .await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Lists every order with its lines, oldest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(pool)
        .await?;

        Self::attach_items(pool, orders).await
    }

    /// Lists one user's orders with their lines
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Self::attach_items(pool, orders).await
    }

    /// Replaces owner and lines of an existing order atomically
    ///
    /// # Returns
    ///
    /// False if no order has this ID; nothing is written in that case.
    pub async fn update(pool: &PgPool, id: Uuid, draft: OrderDraft) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query("UPDATE orders SET user_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(draft.user_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_items(&mut tx, id, &draft.items).await?;

        tx.commit().await?;

        Ok(true)
    }

    /// Deletes an order; its lines cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Checks whether an order exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    async fn attach_items(pool: &PgPool, mut orders: Vec<Self>) -> Result<Vec<Self>, sqlx::Error> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        for order in &mut orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }
}

async fn insert_items(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    lines: &[OrderLine],
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let mut items = Vec::with_capacity(lines.len());

    for (position, line) in lines.iter().enumerate() {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, position)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, product_id, quantity
            "#,
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .fetch_one(&mut **tx)
        .await?;

        items.push(item);
    }

    Ok(items)
}
