/// Bearer-token authentication for Axum
///
/// Extracts the `Authorization: Bearer <token>` header, validates the token
/// and turns its claims into an [`AuthContext`]. The context is stored in the
/// request extensions by the access-control layer and handed to handlers as
/// an ordinary extractor argument, so every handler that needs the caller's
/// identity names it in its signature.
///
/// # Example
///
/// ```no_run
/// use axum::{Router, routing::get};
/// use storefront_shared::auth::middleware::AuthContext;
///
/// async fn whoami(auth: AuthContext) -> String {
///     format!("{} ({})", auth.email, auth.roles.join(", "))
/// }
///
/// let app: Router = Router::new().route("/whoami", get(whoami));
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};

/// Message returned for every authentication failure
pub const UNAUTHENTICATED_MESSAGE: &str = "Authentication required";

/// Validated caller identity
///
/// Built only from a token that passed signature and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email claim
    pub email: String,

    /// Role names carried by the token
    pub roles: Vec<String>,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
            roles: claims.roles.clone(),
        }
    }

    /// Checks whether the caller holds a role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Error type for authentication
///
/// Variants exist for logging; the HTTP response is identical for all of them.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not a bearer token
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),
}

impl AuthError {
    /// Short reason for logs
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::InvalidFormat(_) => "invalid_format",
            AuthError::InvalidToken(e) => e.reason(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            Json(json!({
                "error": "unauthorized",
                "message": UNAUTHENTICATED_MESSAGE,
            })),
        )
            .into_response()
    }
}

/// Pulls the raw token out of an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("header is not valid ASCII".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty bearer token".to_string()));
    }

    Ok(token)
}

/// Authenticates a request from its headers
///
/// # Errors
///
/// Returns `AuthError` when the header is missing or malformed, or when the
/// token is malformed, badly signed or expired.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_token(token, secret)?;
    Ok(AuthContext::from_claims(&claims))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}
