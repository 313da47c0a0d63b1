/// Middleware modules for the API server
///
/// - `access`: Per-route authentication and role policy
/// - `security`: Security response headers

pub mod access;
pub mod security;
