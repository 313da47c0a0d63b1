/// Role-based authorization checks
///
/// Roles are flat names. There is no hierarchy: `Admin` does not imply
/// `User`, and a rule that names only `User` rejects a caller holding only
/// `Admin`. Every check takes the caller's [`AuthContext`] explicitly.
///
/// # Example
///
/// ```
/// use storefront_shared::auth::authorization::{authorize, ROLE_ADMIN, ROLE_USER};
/// use storefront_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let shopper = AuthContext {
///     user_id: Uuid::new_v4(),
///     email: "shopper@example.com".to_string(),
///     roles: vec![ROLE_USER.to_string()],
/// };
///
/// assert!(authorize(&[], &shopper).is_ok());
/// assert!(authorize(&[ROLE_USER], &shopper).is_ok());
/// assert!(authorize(&[ROLE_ADMIN], &shopper).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;

/// Administrator role name
pub const ROLE_ADMIN: &str = "Admin";

/// Ordinary customer role name
pub const ROLE_USER: &str = "User";

/// Role given to every self-registered user
pub const DEFAULT_ROLE: &str = ROLE_USER;

/// Roles the bootstrap routine guarantees exist
pub const BUILTIN_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_USER];

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller holds none of the required roles
    #[error("Insufficient role. Required one of: {}", .required.join(", "))]
    InsufficientRole { required: Vec<String> },

    /// Caller is neither the resource owner nor privileged
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Allows the caller iff they hold at least one of `required`
///
/// An empty `required` list means "any authenticated caller".
pub fn authorize(required: &[&str], auth: &AuthContext) -> Result<(), AuthzError> {
    if required.is_empty() {
        return Ok(());
    }

    if required.iter().any(|role| auth.has_role(role)) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required: required.iter().map(|r| r.to_string()).collect(),
        })
    }
}

/// Requires a single role
pub fn require_role(auth: &AuthContext, role: &str) -> Result<(), AuthzError> {
    authorize(&[role], auth)
}

/// Allows the owner of a resource or any holder of `roles`
pub fn require_self_or_role(
    auth: &AuthContext,
    owner_id: Uuid,
    roles: &[&str],
) -> Result<(), AuthzError> {
    if auth.user_id == owner_id {
        return Ok(());
    }

    if !roles.is_empty() && authorize(roles, auth).is_ok() {
        return Ok(());
    }

    Err(AuthzError::NotAuthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(roles: &[&str]) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            email: "caller@example.com".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_requirement_allows_any_caller() {
        assert!(authorize(&[], &context(&[])).is_ok());
        assert!(authorize(&[], &context(&[ROLE_USER])).is_ok());
    }

    #[test]
    fn test_intersection_rule() {
        let admin = context(&[ROLE_ADMIN]);
        let user = context(&[ROLE_USER]);
        let both = context(&[ROLE_ADMIN, ROLE_USER]);

        assert!(authorize(&[ROLE_ADMIN], &admin).is_ok());
        assert!(authorize(&[ROLE_ADMIN], &user).is_err());
        assert!(authorize(&[ROLE_ADMIN, ROLE_USER], &user).is_ok());
        assert!(authorize(&[ROLE_USER], &both).is_ok());
    }

    #[test]
    fn test_no_role_hierarchy() {
        let admin = context(&[ROLE_ADMIN]);
        assert_eq!(
            authorize(&[ROLE_USER], &admin),
            Err(AuthzError::InsufficientRole {
                required: vec![ROLE_USER.to_string()]
            })
        );
    }

    #[test]
    fn test_role_names_are_case_sensitive() {
        assert!(authorize(&[ROLE_ADMIN], &context(&["admin"])).is_err());
    }

    #[test]
    fn test_require_self_or_role() {
        let user = context(&[ROLE_USER]);
        let admin = context(&[ROLE_ADMIN]);
        let other = Uuid::new_v4();

        assert!(require_self_or_role(&user, user.user_id, &[ROLE_ADMIN]).is_ok());
        assert_eq!(
            require_self_or_role(&user, other, &[ROLE_ADMIN]),
            Err(AuthzError::NotAuthorized)
        );
        assert!(require_self_or_role(&admin, other, &[ROLE_ADMIN]).is_ok());
        assert!(require_self_or_role(&admin, other, &[]).is_err());
    }

    #[test]
    fn test_authz_error_display() {
        let err = AuthzError::InsufficientRole {
            required: vec![ROLE_ADMIN.to_string()],
        };
        assert_eq!(err.to_string(), "Insufficient role. Required one of: Admin");
        assert!(AuthzError::NotAuthorized.to_string().contains("Not authorized"));
    }
}
