//! Authentication module for managing the admin session and its credential.
//!
//! This module provides:
//! - `CredentialStore`: persistence for the single session token, with
//!   file, OS keychain and in-memory backends
//! - `SessionController`: sign-in, sign-out and startup validation
//!
//! The stored token carries the expiry the server handed out at sign-in;
//! an expired token is never returned by a store.

pub mod credentials;
pub mod error;
pub mod session;

pub use credentials::{
    Credential, CredentialStore, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore,
};
pub use error::AuthError;
pub use session::{LoginForm, SessionController, SessionState};
