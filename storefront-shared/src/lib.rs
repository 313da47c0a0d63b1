//! # Storefront Shared Library
//!
//! Domain types, persistence and security primitives used by the storefront
//! API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, bearer tokens and the role gate
//! - `db`: Connection pool and embedded migrations
//! - `models`: Users, roles, products and orders
//! - `seed`: Idempotent bootstrap data

pub mod auth;
pub mod db;
pub mod models;
pub mod seed;

/// Current version of the storefront shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
