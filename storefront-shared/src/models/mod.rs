/// Database models
///
/// Each model is a plain struct with async associated functions that take a
/// `&PgPool`. Multi-row writes open their own transaction.
///
/// # Models
///
/// - `user`: Accounts and credentials
/// - `role`: Role names and user-role membership
/// - `user_claim`: Extra claims copied into issued tokens
/// - `product`: Catalogue entries
/// - `order`: Orders and their lines
///
/// # Example
///
/// ```no_run
/// use storefront_shared::db::pool::{create_pool, DatabaseConfig};
/// use storefront_shared::models::{product::Product, role::Role};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new("postgres://localhost/storefront")).await?;
///
/// let admin = Role::ensure_exists(&pool, "Admin").await?;
/// let catalogue = Product::list(&pool).await?;
/// # Ok(())
/// # }
/// ```

pub mod order;
pub mod product;
pub mod role;
pub mod user;
pub mod user_claim;
