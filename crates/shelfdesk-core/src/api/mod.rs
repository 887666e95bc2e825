//! REST API client module for the product catalogue admin API.
//!
//! This module provides the `ApiClient` for signing in, validating and
//! revoking tokens, and listing/creating/updating/deleting products.
//!
//! Authenticated calls take an explicit `AuthContext`; the client itself
//! never holds a token.

pub mod client;
pub mod context;
pub mod error;

pub use client::{AdminApi, ApiClient, SignInGrant, DEFAULT_API_BASE};
pub use context::AuthContext;
pub use error::ApiError;
