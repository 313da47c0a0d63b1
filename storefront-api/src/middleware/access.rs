/// Route access control
///
/// Every route's access rule lives in one table, [`POLICIES`], keyed by HTTP
/// method and the route pattern as registered on the router. The
/// [`access_control`] middleware runs after routing (it is installed with
/// `route_layer`), looks up the matched pattern and then:
///
/// 1. lets [`Access::Public`] routes through untouched;
/// 2. otherwise validates the bearer token (401 on any failure);
/// 3. applies the role gate (403 when no required role is held);
/// 4. stores the caller's `AuthContext` in the request extensions, where
///    handlers pick it up as an extractor argument.
///
/// A route with no entry in the table is refused with 403.

use axum::{
    extract::{MatchedPath, Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use storefront_shared::auth::{
    authorization::{authorize, ROLE_ADMIN},
    middleware::{authenticate, AuthError},
};
use tracing::{debug, warn};

use crate::{app::AppState, error::ApiError};

/// Access rule for one route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No token needed
    Public,

    /// Any valid token
    Authenticated,

    /// Valid token holding at least one of these roles
    Roles(&'static [&'static str]),
}

impl Access {
    fn required_roles(&self) -> &'static [&'static str] {
        match *self {
            Access::Public | Access::Authenticated => &[],
            Access::Roles(roles) => roles,
        }
    }
}

/// One row of the policy table
#[derive(Debug, Clone, Copy)]
pub struct RoutePolicy {
    /// Upper-case method name
    pub method: &'static str,
    pub path: &'static str,
    pub access: Access,
}

const ADMIN_ONLY: Access = Access::Roles(&[ROLE_ADMIN]);

const fn policy(method: &'static str, path: &'static str, access: Access) -> RoutePolicy {
    RoutePolicy {
        method,
        path,
        access,
    }
}

/// Access rules for every route the server exposes
pub const POLICIES: &[RoutePolicy] = &[
    policy("GET", "/health", Access::Public),
    // Authentication
    policy("POST", "/api/auth/register", Access::Public),
    policy("POST", "/api/auth/login", Access::Public),
    // Catalogue
    policy("GET", "/api/products", Access::Public),
    policy("GET", "/api/products/:id", Access::Public),
    policy("POST", "/api/products", ADMIN_ONLY),
    policy("PUT", "/api/products/:id", ADMIN_ONLY),
    policy("DELETE", "/api/products/:id", ADMIN_ONLY),
    // Orders
    policy("GET", "/api/orders", ADMIN_ONLY),
    policy("GET", "/api/orders/:id", Access::Authenticated),
    policy("POST", "/api/orders", Access::Authenticated),
    policy("PUT", "/api/orders/:id", ADMIN_ONLY),
    policy("DELETE", "/api/orders/:id", ADMIN_ONLY),
    // Users; self-access on :id is checked in the handler
    policy("GET", "/api/users", ADMIN_ONLY),
    policy("POST", "/api/users", ADMIN_ONLY),
    policy("POST", "/api/users/assign-role", ADMIN_ONLY),
    policy("GET", "/api/users/:id", Access::Authenticated),
    policy("PUT", "/api/users/:id", Access::Authenticated),
    policy("DELETE", "/api/users/:id", ADMIN_ONLY),
    policy("PUT", "/api/users/:id/roles", ADMIN_ONLY),
];

/// Finds the rule for a method and matched route pattern
///
/// HEAD requests follow the GET rule, as axum serves them with the GET
/// handler.
pub fn policy_for(method: &Method, path: &str) -> Option<Access> {
    let method = if *method == Method::HEAD {
        &Method::GET
    } else {
        method
    };

    POLICIES
        .iter()
        .find(|p| p.method == method.as_str() && p.path == path)
        .map(|p| p.access)
}

/// Middleware enforcing [`POLICIES`]
pub async fn access_control(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let Some(path) = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
    else {
        warn!(%method, uri = %req.uri(), "Request reached access control without a matched route");
        return ApiError::Forbidden("Access denied".to_string()).into_response();
    };

    let Some(access) = policy_for(&method, &path) else {
        warn!(%method, path = %path, "No access policy for route, refusing");
        return ApiError::Forbidden("Access denied".to_string()).into_response();
    };

    if access == Access::Public {
        return next.run(req).await;
    }

    let auth = match authenticate(req.headers(), state.jwt_secret()) {
        Ok(auth) => auth,
        Err(err @ AuthError::MissingCredentials) => {
            debug!(%method, path = %path, reason = err.reason(), "Unauthenticated request");
            return err.into_response();
        }
        Err(err) => {
            warn!(%method, path = %path, reason = err.reason(), "Rejected bearer token");
            return err.into_response();
        }
    };

    if let Err(err) = authorize(access.required_roles(), &auth) {
        debug!(
            %method,
            path = %path,
            user_id = %auth.user_id,
            roles = ?auth.roles,
            "Caller lacks required role"
        );
        return ApiError::from(err).into_response();
    }

    req.extensions_mut().insert(auth);
    next.run(req).await
}
