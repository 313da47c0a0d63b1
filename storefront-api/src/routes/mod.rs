/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `products`: Catalogue
/// - `orders`: Orders and their lines
/// - `users`: User and role administration

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;
