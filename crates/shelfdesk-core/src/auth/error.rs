use thiserror::Error;

use crate::api::ApiError;

/// Failures of the session controller.
///
/// None of these are fatal: after any of them the session is back in a
/// valid state (Anonymous, or unchanged).
#[derive(Error, Debug)]
pub enum AuthError {
    /// Bad credentials, or the server refused the stored token.
    #[error("Sign-in rejected: {0}")]
    Rejected(String),

    /// The remote call failed before the server could answer.
    #[error("Unable to reach server: {0}")]
    Network(#[source] ApiError),

    /// Best-effort logout failed; the local session was cleared anyway.
    #[error("Logout failed: {0}")]
    Logout(#[source] ApiError),
}

impl AuthError {
    /// Classify a failed sign-in or validation call.
    pub fn from_api(err: ApiError) -> Self {
        if err.is_auth_rejection() {
            let message = match err {
                ApiError::Rejected(m) | ApiError::BadRequest(m) | ApiError::AccessDenied(m)
                    if !m.is_empty() =>
                {
                    m
                }
                other => other.to_string(),
            };
            AuthError::Rejected(message)
        } else {
            AuthError::Network(err)
        }
    }

    /// Message suitable for showing in the login form.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected(m) if m.is_empty() => "Invalid username or password".to_string(),
            AuthError::Rejected(m) => format!("Login failed: {}", m),
            AuthError::Network(ApiError::NetworkError(e)) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            AuthError::Network(ApiError::NetworkError(_)) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            AuthError::Network(e) => format!("Login failed: {}", e),
            AuthError::Logout(e) => format!("Logout failed: {}", e),
        }
    }
}
