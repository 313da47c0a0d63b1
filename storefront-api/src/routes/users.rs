/// User and role administration
///
/// # Endpoints
///
/// - `GET    /api/users` - List users (Admin)
/// - `POST   /api/users` - Create a user with roles (Admin)
/// - `POST   /api/users/assign-role` - Add one role to a user by email (Admin)
/// - `GET    /api/users/:id` - View a user (self or Admin)
/// - `PUT    /api/users/:id` - Update profile (self or Admin)
/// - `DELETE /api/users/:id` - Delete a user (Admin)
/// - `PUT    /api/users/:id/roles` - Replace a user's roles (Admin)

use crate::{
    app::AppState,
    error::{ensure_valid, ApiError, ApiResult, ValidationErrorDetail},
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::auth::password_problems,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_shared::{
    auth::{
        authorization::{require_self_or_role, DEFAULT_ROLE, ROLE_ADMIN},
        middleware::AuthContext,
        password,
    },
    models::{
        role::Role,
        user::{CreateUser, UpdateUser, User},
    },
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 500;

/// User as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserResponse {
    pub fn new(user: User, roles: Vec<String>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            roles,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Paging for the user list
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListUsersQuery {
    fn bounds(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Admin user creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,

    /// Roles to grant; defaults to `User`
    pub roles: Option<Vec<String>>,
}

/// Profile update request
///
/// Absent fields are left alone; an empty name clears it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,

    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,
}

/// Single role grant
#[derive(Debug, Deserialize, Validate)]
pub struct AssignRoleRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

/// Result of a role grant
#[derive(Debug, Serialize)]
pub struct AssignRoleResponse {
    pub message: String,
    pub email: String,
    pub role: String,
    pub roles: Vec<String>,
}

/// Full role set replacement
#[derive(Debug, Deserialize)]
pub struct ReplaceRolesRequest {
    pub roles: Vec<String>,
}

/// Resolves role names, reporting unknown ones on the `roles` field
async fn resolve_roles(state: &AppState, names: &[String]) -> ApiResult<Vec<Role>> {
    let (found, missing) = Role::find_many(&state.db, names).await?;

    if !missing.is_empty() {
        return Err(ApiError::ValidationError(
            missing
                .into_iter()
                .map(|name| ValidationErrorDetail {
                    field: "roles".to_string(),
                    message: format!("Role '{}' does not exist", name),
                })
                .collect(),
        ));
    }

    Ok(found)
}

fn blank_to_none(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// List users with their roles
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let (limit, offset) = query.bounds();
    let users = User::list(&state.db, limit, offset).await?;

    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let mut roles = Role::names_for_users(&state.db, &ids).await?;

    Ok(Json(
        users
            .into_iter()
            .map(|user| {
                let user_roles = roles.remove(&user.id).unwrap_or_default();
                UserResponse::new(user, user_roles)
            })
            .collect(),
    ))
}

/// View one user
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither this user nor an Admin
/// - `404 Not Found`: No such user
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    require_self_or_role(&auth, id, &[ROLE_ADMIN])?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let roles = Role::names_for_user(&state.db, id).await?;

    Ok(Json(UserResponse::new(user, roles)))
}

/// Create a user on behalf of an Admin
///
/// Returns `201 Created` with a `Location` header.
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_valid(&req, password_problems(&req.password))?;

    let email = req.email.trim().to_string();
    if User::email_exists(&state.db, &email).await? {
        return Err(ApiError::duplicate_email());
    }

    let role_names = req
        .roles
        .clone()
        .unwrap_or_else(|| vec![DEFAULT_ROLE.to_string()]);
    let roles = resolve_roles(&state, &role_names).await?;
    let role_refs: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();

    let user = User::create_with_roles(
        &state.db,
        CreateUser {
            email,
            password_hash: password::hash_password(&req.password)?,
            first_name: req.first_name.and_then(blank_to_none),
            last_name: req.last_name.and_then(blank_to_none),
        },
        &role_refs,
    )
    .await?;

    info!(user_id = %user.id, created_by = %auth.user_id, roles = ?role_refs, "User created");

    let roles = Role::names_for_user(&state.db, user.id).await?;
    let location = format!("/api/users/{}", user.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(UserResponse::new(user, roles)),
    ))
}

/// Update a user's profile
///
/// Returns `204 No Content`.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email taken
/// - `403 Forbidden`: Caller is neither this user nor an Admin
/// - `404 Not Found`: No such user
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<StatusCode> {
    require_self_or_role(&auth, id, &[ROLE_ADMIN])?;

    let extra: Vec<ValidationErrorDetail> = req
        .password
        .as_deref()
        .map(password_problems)
        .unwrap_or_default();
    ensure_valid(&req, extra)?;

    let existing = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let email = req.email.map(|e| e.trim().to_string());
    if let Some(email) = email.as_deref() {
        if !email.eq_ignore_ascii_case(&existing.email) && User::email_exists(&state.db, email).await? {
            return Err(ApiError::duplicate_email());
        }
    }

    let password_hash = match req.password.as_deref() {
        Some(pw) => Some(password::hash_password(pw)?),
        None => None,
    };

    let changes = UpdateUser {
        email,
        password_hash,
        first_name: req.first_name.map(blank_to_none),
        last_name: req.last_name.map(blank_to_none),
    };

    if changes.is_empty() {
        return Ok(StatusCode::NO_CONTENT);
    }

    User::update(&state.db, id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %id, updated_by = %auth.user_id, "User updated");

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user; unknown IDs are ignored
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = User::delete(&state.db, id).await?;

    if deleted {
        info!(user_id = %id, deleted_by = %auth.user_id, "User deleted");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Grant one existing role to a user found by email
///
/// # Errors
///
/// - `400 Bad Request`: Role does not exist
/// - `404 Not Found`: No user with this email
pub async fn assign_role(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<AssignRoleRequest>,
) -> ApiResult<Json<AssignRoleResponse>> {
    req.validate()?;

    let role = Role::find_by_name(&state.db, &req.role)
        .await?
        .ok_or_else(|| ApiError::field("role", format!("Role '{}' does not exist", req.role)))?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let added = role.add_to_user(&state.db, user.id).await?;
    let roles = Role::names_for_user(&state.db, user.id).await?;

    info!(
        user_id = %user.id,
        role = %role.name,
        added,
        assigned_by = %auth.user_id,
        "Role assigned"
    );

    Ok(Json(AssignRoleResponse {
        message: if added {
            "Role assigned successfully".to_string()
        } else {
            "User already has this role".to_string()
        },
        email: user.email,
        role: role.name,
        roles,
    }))
}

/// Replace a user's whole role set atomically
///
/// Returns `204 No Content`. An empty list removes every role.
pub async fn replace_roles(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ReplaceRolesRequest>,
) -> ApiResult<StatusCode> {
    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let roles = resolve_roles(&state, &req.roles).await?;
    let role_ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();

    Role::replace_for_user(&state.db, id, &role_ids).await?;

    info!(
        user_id = %id,
        roles = ?req.roles,
        updated_by = %auth.user_id,
        "Roles replaced"
    );

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_bounds_are_clamped() {
        assert_eq!(ListUsersQuery::default().bounds(), (DEFAULT_PAGE_SIZE, 0));
        let query = ListUsersQuery {
            limit: Some(10_000),
            offset: Some(-5),
        };
        assert_eq!(query.bounds(), (MAX_PAGE_SIZE, 0));
        let query = ListUsersQuery {
            limit: Some(0),
            offset: Some(20),
        };
        assert_eq!(query.bounds(), (1, 20));
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none("  ".to_string()), None);
        assert_eq!(blank_to_none(" Ada ".to_string()).as_deref(), Some("Ada"));
    }

    #[test]
    fn test_user_response_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        };

        let json = serde_json::to_string(&UserResponse::new(user, vec!["User".to_string()])).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"roles\":[\"User\"]"));
    }
}
