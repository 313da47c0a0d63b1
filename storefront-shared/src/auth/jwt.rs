/// JWT token issuance and validation module
///
/// Bearer tokens are compact JWTs signed with HS256 (HMAC-SHA256) using a
/// server-held secret. A token carries the user's identity, email and the
/// role names assigned at issuance time. Nothing is stored server-side: a
/// token is valid exactly when its signature verifies and it has not expired.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable, 6 hours by default, no refresh tokens
/// - **Validation**: Signature, expiration, not-before and issuer checks, zero leeway
/// - **Secret Management**: Secrets must be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use storefront_shared::auth::jwt::{create_token, validate_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(
///     user_id,
///     "shopper@example.com",
///     vec!["User".to_string()],
///     Duration::hours(6),
/// );
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, user_id);
/// assert!(validated.has_role("User"));
/// # Ok(())
/// # }
/// ```

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into every token and required on validation
pub const ISSUER: &str = "storefront";

/// Default token lifetime in hours
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 6;

/// Minimum accepted length of the signing secret, in bytes
pub const MIN_SECRET_LENGTH: usize = 32;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signing secret is unusable
    #[error("Invalid signing secret: {0}")]
    InvalidSecret(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature does not match the token contents
    #[error("Token signature is invalid")]
    InvalidSignature,

    /// Invalid token format
    #[error("Invalid token format: {0}")]
    Malformed(String),

    /// Issuer claim does not match
    #[error("Invalid issuer")]
    InvalidIssuer,

    /// Any other validation failure
    #[error("Failed to validate token: {0}")]
    ValidationError(String),
}

impl JwtError {
    /// Short machine-readable reason, used in logs only
    pub fn reason(&self) -> &'static str {
        match self {
            JwtError::CreateError(_) => "create_error",
            JwtError::InvalidSecret(_) => "invalid_secret",
            JwtError::Expired => "expired",
            JwtError::InvalidSignature => "bad_signature",
            JwtError::Malformed(_) => "malformed",
            JwtError::InvalidIssuer => "invalid_issuer",
            JwtError::ValidationError(_) => "invalid",
        }
    }
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "storefront")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `email`: Login email of the user
/// - `roles`: Role names assigned when the token was issued
/// - `ext`: Additional claims stored for the user, keyed by claim type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Email claim
    pub email: String,

    /// Role claims, sorted and without duplicates
    #[serde(default)]
    pub roles: Vec<String>,

    /// Stored per-user claims (claim type -> values)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ext: BTreeMap<String, Vec<String>>,

    /// Issuer - Always "storefront"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims for a user, expiring `expires_in` from now
    ///
    /// Role names are sorted and deduplicated so two tokens for the same role
    /// set always carry identical `roles` arrays.
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        roles: Vec<String>,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        let mut roles = roles;
        roles.sort();
        roles.dedup();

        Self {
            sub: user_id,
            email: email.into(),
            roles,
            ext: BTreeMap::new(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Adds stored claims as `(claim_type, claim_value)` pairs
    ///
    /// These never touch `roles`; role claims come only from role assignments.
    pub fn with_extra<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (claim_type, value) in pairs {
            self.ext.entry(claim_type).or_default().push(value);
        }
        self
    }

    /// Checks whether the token carries a role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Checks that a signing secret is usable
///
/// Called once at startup; a failure here is fatal configuration, never a
/// per-request error.
pub fn validate_secret(secret: &str) -> Result<(), JwtError> {
    if secret.trim().is_empty() {
        return Err(JwtError::InvalidSecret("secret is empty".to_string()));
    }

    if secret.len() < MIN_SECRET_LENGTH {
        return Err(JwtError::InvalidSecret(format!(
            "secret must be at least {} bytes, got {}",
            MIN_SECRET_LENGTH,
            secret.len()
        )));
    }

    Ok(())
}

/// Creates a JWT token from claims
///
/// Signs the token using HS256 (HMAC-SHA256) with the provided secret.
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies:
/// - Signature is valid
/// - Token hasn't expired (no leeway: a token is rejected from its `exp` second on)
/// - Issuer is "storefront"
/// - Token is not used before nbf time
///
/// # Errors
///
/// Returns a `JwtError` describing why the token was rejected. Callers facing
/// clients should not forward the distinction.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::Expired,
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => JwtError::Malformed(e.to_string()),
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    // jsonwebtoken accepts exp == now; the token is already dead at that second
    if token_data.claims.is_expired() {
        return Err(JwtError::Expired);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn user_claims(roles: &[&str]) -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "shopper@example.com",
            roles.iter().map(|r| r.to_string()).collect(),
            Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
        )
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(
            user_id,
            "a@b.com",
            vec!["User".to_string()],
            Duration::hours(6),
        );

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 6 * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_roles_are_sorted_and_deduplicated() {
        let claims = user_claims(&["User", "Admin", "User"]);
        assert_eq!(claims.roles, vec!["Admin".to_string(), "User".to_string()]);
    }

    #[test]
    fn test_with_extra_groups_by_type() {
        let claims = user_claims(&["User"]).with_extra(vec![
            ("department".to_string(), "sales".to_string()),
            ("department".to_string(), "support".to_string()),
            ("role".to_string(), "Admin".to_string()),
        ]);

        assert_eq!(
            claims.ext.get("department"),
            Some(&vec!["sales".to_string(), "support".to_string()])
        );
        // a stored claim named "role" does not grant a role
        assert_eq!(claims.roles, vec!["User".to_string()]);
        assert_eq!(claims.ext.get("role"), Some(&vec!["Admin".to_string()]));
    }

    #[test]
    fn test_create_and_validate_token() {
        let claims = user_claims(&["Admin", "User"]);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated, claims);
        assert!(validated.has_role("Admin"));
        assert!(validated.has_role("User"));
    }

    #[test]
    fn test_token_without_roles_validates() {
        let claims = user_claims(&[]);
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_token(&token, SECRET).unwrap();
        assert!(validated.roles.is_empty());
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_token(&user_claims(&["User"]), SECRET).unwrap();

        let result = validate_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "a@b.com",
            vec!["User".to_string()],
            Duration::seconds(-3600),
        );
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        let result = validate_token(&token, SECRET);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_token_expiring_now_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.com", vec![], Duration::zero());
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_malformed_token() {
        let result = validate_token("not-a-jwt", SECRET);
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let token = create_token(&user_claims(&["User"]), SECRET).unwrap();
        let admin = create_token(&user_claims(&["Admin"]), SECRET).unwrap();

        // splice the admin payload onto the user token's signature
        let parts: Vec<&str> = token.split('.').collect();
        let admin_parts: Vec<&str> = admin.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);

        assert!(matches!(
            validate_token(&forged, SECRET),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let mut claims = user_claims(&["User"]);
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::InvalidIssuer)
        ));
    }

    #[test]
    fn test_validate_secret() {
        assert!(validate_secret(SECRET).is_ok());
        assert!(matches!(validate_secret(""), Err(JwtError::InvalidSecret(_))));
        assert!(matches!(
            validate_secret("too-short"),
            Err(JwtError::InvalidSecret(_))
        ));
    }

    #[test]
    fn test_error_reasons_are_distinct() {
        assert_eq!(JwtError::Expired.reason(), "expired");
        assert_eq!(JwtError::InvalidSignature.reason(), "bad_signature");
        assert_eq!(JwtError::Malformed("x".into()).reason(), "malformed");
    }
}
