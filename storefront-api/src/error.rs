/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`; every library error converts into
/// [`ApiError`] with `?`, and `ApiError` renders itself as a JSON body:
///
/// ```json
/// { "error": "validation_error", "message": "...", "details": [{ "field": "email", "message": "..." }] }
/// ```
///
/// # Example
///
/// ```
/// use storefront_api::error::{ApiError, ApiResult};
///
/// fn parse_quantity(raw: &str) -> ApiResult<i32> {
///     raw.parse()
///         .map_err(|_| ApiError::field("quantity", "Quantity must be a whole number"))
/// }
///
/// assert!(parse_quantity("three").is_err());
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;
use storefront_shared::{
    auth::{
        authorization::AuthzError,
        jwt::JwtError,
        middleware::{AuthError, UNAUTHENTICATED_MESSAGE},
        password::PasswordError,
    },
    seed::SeedError,
};
use validator::Validate;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Field-level validation errors (400)
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500); the message is logged, never returned
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.into(),
            message: message.into(),
        }])
    }

    /// The error returned when an email is already registered
    pub fn duplicate_email() -> Self {
        ApiError::field("email", "Email is already registered")
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => match db_err.constraint() {
                    Some(constraint) if constraint.contains("email") => ApiError::duplicate_email(),
                    Some(constraint) => {
                        ApiError::Conflict(format!("Constraint violation: {}", constraint))
                    }
                    None => ApiError::Conflict("Resource already exists".to_string()),
                },
                // Deleting a referenced row versus inserting a dangling reference
                ErrorKind::ForeignKeyViolation
                    if db_err.message().starts_with("update or delete") =>
                {
                    ApiError::Conflict("Resource is still referenced".to_string())
                }
                ErrorKind::ForeignKeyViolation => {
                    ApiError::BadRequest("Referenced resource does not exist".to_string())
                }
                ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                    ApiError::BadRequest(format!("Invalid value: {}", db_err.message()))
                }
                _ => ApiError::InternalError(format!("Database error: {}", db_err)),
            },
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Authentication failures all look alike to the client
impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        ApiError::Unauthorized(UNAUTHENTICATED_MESSAGE.to_string())
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::InsufficientRole { .. } => {
                ApiError::Forbidden("Insufficient permissions".to_string())
            }
            AuthzError::NotAuthorized => {
                ApiError::Forbidden("Not authorized to access this resource".to_string())
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(_) | JwtError::InvalidSecret(_) => {
                ApiError::InternalError(format!("Token issuance failed: {}", err))
            }
            _ => ApiError::Unauthorized(UNAUTHENTICATED_MESSAGE.to_string()),
        }
    }
}

impl From<SeedError> for ApiError {
    fn from(err: SeedError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Body shape problems become field details
///
/// Deserialization failures name the offending field when serde reports a
/// path (`items[0].quantity`) or a missing field; anything else is
/// reported against `body`.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => shape_error(&e.body_text(), "body"),
            JsonRejection::JsonSyntaxError(e) => shape_error(&e.body_text(), "body"),
            JsonRejection::MissingJsonContentType(e) => ApiError::BadRequest(e.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => {
                ApiError::BadRequest(e.body_text())
            }
            other => ApiError::InternalError(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        shape_error(&rejection.body_text(), "query")
    }
}

/// Turns an extractor message into a single field detail
///
/// Messages look like `<context>: [<path>: ]<serde message>`.
fn shape_error(text: &str, fallback: &str) -> ApiError {
    let detail = text.split_once(": ").map_or(text, |(_, rest)| rest);

    let (path, message) = match detail.split_once(": ") {
        Some((path, message)) if !path.contains(' ') => (Some(path), message),
        _ => (None, detail),
    };

    let missing = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(name, _)| name);

    let field = match (path, missing) {
        (Some(path), Some(name)) => format!("{}.{}", path, name),
        (None, Some(name)) => name.to_string(),
        (Some(path), None) => path.to_string(),
        (None, None) => fallback.to_string(),
    };

    ApiError::field(field, message)
}

/// Convert `validator` derive failures into field details
impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(validation_details(&e))
    }
}

/// Flattens `validator` field errors, sorted by field name
pub fn validation_details(e: &validator::ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = e
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

/// Runs derive validation and reports it together with `extra` problems
///
/// Returns every problem in one `ValidationError` so clients can show all
/// of them at once.
pub fn ensure_valid<T: Validate>(value: &T, extra: Vec<ValidationErrorDetail>) -> ApiResult<()> {
    let mut details = match value.validate() {
        Ok(()) => Vec::new(),
        Err(e) => validation_details(&e),
    };
    details.extend(extra);

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(details))
    }
}
