/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Create an account with the default `User` role
/// - `POST /api/auth/login` - Exchange email and password for a bearer token

use crate::{
    app::AppState,
    error::{ensure_valid, ApiError, ApiResult, ValidationErrorDetail},
    extract::ApiJson,
    routes::users::UserResponse,
};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_shared::{
    auth::{
        authorization::DEFAULT_ROLE,
        jwt::{self, Claims},
        password,
    },
    models::{
        role::Role,
        user::{CreateUser, User},
        user_claim::UserClaim,
    },
};
use tracing::{debug, info};
use validator::Validate;

/// Message for every failed login, whatever the cause
pub const LOGIN_FAILED_MESSAGE: &str = "Authentication failed";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (strength is checked separately)
    pub password: String,

    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,

    /// Signed bearer token
    pub token: String,

    /// Always `Bearer`
    pub token_type: String,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Password strength problems as `password` field details
pub(crate) fn password_problems(password: &str) -> Vec<ValidationErrorDetail> {
    match password::validate_password_strength(password) {
        Ok(()) => Vec::new(),
        Err(problems) => problems
            .into_iter()
            .map(|message| ValidationErrorDetail {
                field: "password".to_string(),
                message,
            })
            .collect(),
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "shopper@example.com",
///   "password": "Secret123!",
///   "first_name": "Sam",
///   "last_name": "Shopper"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, weak password, or email taken
///   (reported on the `email` field)
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    ensure_valid(&req, password_problems(&req.password))?;

    let email = req.email.trim().to_string();

    if User::email_exists(&state.db, &email).await? {
        debug!(email = %email, "Registration rejected, email taken");
        return Err(ApiError::duplicate_email());
    }

    let password_hash = password::hash_password(&req.password)?;

    // A concurrent registration loses on the unique index and maps to the
    // same duplicate-email error
    let user = User::create_with_roles(
        &state.db,
        CreateUser {
            email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
        },
        &[DEFAULT_ROLE],
    )
    .await?;

    info!(user_id = %user.id, "User registered");

    let roles = Role::names_for_user(&state.db, user.id).await?;

    Ok(Json(RegisterResponse {
        message: "User registered successfully".to_string(),
        user: UserResponse::new(user, roles),
    }))
}

/// Log in and receive a bearer token
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// { "email": "shopper@example.com", "password": "Secret123!" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Login successful",
///   "token": "eyJ...",
///   "token_type": "Bearer",
///   "expires_at": "2024-06-01T18:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (same message)
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let Some(user) = User::find_by_email(&state.db, req.email.trim()).await? else {
        debug!("Login failed: unknown email");
        return Err(ApiError::Unauthorized(LOGIN_FAILED_MESSAGE.to_string()));
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        debug!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::Unauthorized(LOGIN_FAILED_MESSAGE.to_string()));
    }

    let roles = Role::names_for_user(&state.db, user.id).await?;
    let extra = UserClaim::list_for_user(&state.db, user.id)
        .await?
        .into_iter()
        .map(UserClaim::into_pair);

    let claims = Claims::new(user.id, user.email.clone(), roles, state.token_lifetime())
        .with_extra(extra);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    User::update_last_login(&state.db, user.id).await?;

    info!(user_id = %user.id, roles = ?claims.roles, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        token_type: "Bearer".to_string(),
        expires_at: claims.expires_at(),
    }))
}
