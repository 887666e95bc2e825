use std::fmt;

use reqwest::{header, RequestBuilder};

/// Per-request authentication context.
///
/// Carries the session token to each API call. The token is sent verbatim in
/// the `Authorization` header (the catalogue API does not use a `Bearer`
/// prefix). Debug and Display never print the token.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    token: String,
}

impl AuthContext {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The raw token, for sending to the server or persisting.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(header::AUTHORIZATION, &self.token)
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthContext([REDACTED])")
    }
}

impl fmt::Display for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED TOKEN]")
    }
}
