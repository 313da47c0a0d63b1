//! # Storefront API Server Library
//!
//! HTTP API for a small online store: accounts and bearer-token login,
//! a product catalogue, orders, and Admin-only user and role management.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `cli`: Command-line arguments for the server binary
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with JSON error bodies
//! - `middleware`: Route access control and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
