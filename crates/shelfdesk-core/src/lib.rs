//! Core library for shelfdesk.
//!
//! This crate holds everything that does not depend on a particular front end:
//!
//! - `api`: REST client for the product catalogue admin API
//! - `auth`: credential persistence and the sign-in/sign-out session controller
//! - `catalog`: page-at-a-time product listing with a windowed page strip
//! - `console`: orchestration of session and listing
//! - `models`: wire types and the product editor draft
//! - `config`: on-disk configuration and environment overrides

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod console;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{AdminApi, ApiClient, ApiError, AuthContext};
pub use auth::{
    AuthError, CredentialStore, FileCredentialStore, KeyringCredentialStore, LoginForm,
    MemoryCredentialStore, SessionController, SessionState,
};
pub use catalog::{FetchOutcome, FetchRequest, FetchTicket, Pager, PAGES_PER_GROUP};
pub use config::{Config, CredentialBackend};
pub use console::{Console, ConsoleError};
pub use models::{DraftError, DraftField, PageDescriptor, Product, ProductDraft, ProductPage};
