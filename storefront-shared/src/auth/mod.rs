/// Authentication and authorization utilities
///
/// This module provides the security primitives of the storefront:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: Bearer token issuance and validation (HS256)
/// - [`middleware`]: Bearer header parsing and the `AuthContext` extractor
/// - [`authorization`]: Role gate (`authorize`) and ownership checks
///
/// # Example
///
/// ```no_run
/// use storefront_shared::auth::password::{hash_password, verify_password};
/// use storefront_shared::auth::jwt::{create_token, validate_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Secret123!")?;
/// assert!(verify_password("Secret123!", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "a@b.com", vec!["User".into()], Duration::hours(6));
/// let token = create_token(&claims, "secret-key-that-is-at-least-32-bytes")?;
/// let claims = validate_token(&token, "secret-key-that-is-at-least-32-bytes")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
