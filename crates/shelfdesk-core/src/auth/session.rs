//! Admin session state machine.
//!
//! Two states, `Anonymous` (initial) and `Authenticated`. The controller is
//! the only writer of the stored credential and of the active `AuthContext`.

use tracing::{debug, info, warn};

use crate::api::{AdminApi, AuthContext};

use super::{AuthError, CredentialStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Login form input.
#[derive(Default, Clone, PartialEq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn reset(&mut self) {
        self.username.clear();
        self.password.clear();
    }

    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

pub struct SessionController<S> {
    store: S,
    state: SessionState,
    context: Option<AuthContext>,
    busy: bool,
}

impl<S: CredentialStore> SessionController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: SessionState::Anonymous,
            context: None,
            busy: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// True while a sign-in, validation or sign-out call is in flight.
    ///
    /// Advisory only: overlapping calls are not rejected, callers are
    /// expected to hold off while this is set.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Context to attach to authenticated API calls, while signed in.
    pub fn context(&self) -> Option<&AuthContext> {
        self.context.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Startup validation: try to resume the session from the stored token.
    ///
    /// With no stored token nothing is sent. If the server does not confirm
    /// the token, the stored credential is cleared and the session stays
    /// Anonymous. Returns true when the session became Authenticated.
    pub async fn restore<A: AdminApi>(&mut self, api: &A) -> bool {
        let Some(token) = self.store.load() else {
            debug!("No stored credential");
            // An expired credential may still be sitting in the store.
            self.clear_store();
            return false;
        };

        self.busy = true;
        let ctx = AuthContext::new(token);
        let result = api.check(&ctx).await;
        self.busy = false;

        match result {
            Ok(true) => {
                info!("Stored session validated");
                self.context = Some(ctx);
                self.state = SessionState::Authenticated;
                true
            }
            Ok(false) => {
                warn!("Stored session rejected by server");
                self.drop_session();
                false
            }
            Err(e) => {
                warn!(error = %e, "Stored session validation failed");
                self.drop_session();
                false
            }
        }
    }

    /// Sign in with the form's credentials.
    ///
    /// On success the new token is persisted and becomes the active context.
    /// On failure nothing changes: the state and the store are untouched.
    pub async fn sign_in<A: AdminApi>(
        &mut self,
        api: &A,
        form: &LoginForm,
    ) -> Result<(), AuthError> {
        self.busy = true;
        let result = api.sign_in(form.username.trim(), &form.password).await;
        self.busy = false;

        let grant = result.map_err(|e| {
            warn!(error = %e, "Sign-in failed");
            AuthError::from_api(e)
        })?;

        if let Err(e) = self.store.save(&grant.token, grant.expires_at) {
            warn!(error = %e, "Failed to persist credential");
        }

        self.context = Some(AuthContext::new(grant.token));
        self.state = SessionState::Authenticated;
        info!(expires_at = %grant.expires_at, "Sign-in successful");
        Ok(())
    }

    /// Sign out.
    ///
    /// The remote logout is best effort; whatever it returns, the stored
    /// credential is cleared, the context dropped, the form reset and the
    /// session is Anonymous afterwards. A failed remote logout is reported
    /// as `AuthError::Logout`.
    pub async fn sign_out<A: AdminApi>(
        &mut self,
        api: &A,
        form: &mut LoginForm,
    ) -> Result<(), AuthError> {
        let result = match self.context.take() {
            Some(ctx) => {
                self.busy = true;
                let result = api.logout(&ctx).await;
                self.busy = false;
                result
            }
            None => Ok(()),
        };

        self.drop_session();
        form.reset();

        match result {
            Ok(()) => {
                info!("Signed out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Logout request failed; local session cleared");
                Err(AuthError::Logout(e))
            }
        }
    }

    fn drop_session(&mut self) {
        self.context = None;
        self.state = SessionState::Anonymous;
        self.clear_store();
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;
    use crate::testing::{Call, FakeApi};
    use chrono::{Duration, Utc};

    fn controller_with_token(token: &str) -> SessionController<MemoryCredentialStore> {
        let store = MemoryCredentialStore::new();
        store.save(token, Utc::now() + Duration::hours(1)).unwrap();
        SessionController::new(store)
    }

    #[tokio::test]
    async fn test_restore_without_credential_makes_no_call() {
        let api = FakeApi::new();
        let mut session = SessionController::new(MemoryCredentialStore::new());

        assert!(!session.restore(&api).await);
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_restore_with_expired_credential_clears_it() {
        let api = FakeApi::new();
        let store = MemoryCredentialStore::new();
        store.save("old", Utc::now() - Duration::minutes(1)).unwrap();
        let mut session = SessionController::new(store);

        assert!(!session.restore(&api).await);
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.store().stored().is_none());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_restore_with_valid_credential() {
        let api = FakeApi::new();
        let mut session = controller_with_token("tok");

        assert!(session.restore(&api).await);
        assert!(session.is_authenticated());
        assert_eq!(session.context().map(|c| c.token()), Some("tok"));
        assert_eq!(api.calls(), vec![Call::Check("tok".into())]);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_restore_with_rejected_credential_clears_it() {
        let api = FakeApi::new();
        api.reject_token();
        let mut session = controller_with_token("tok");

        assert!(!session.restore(&api).await);
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.context().is_none());
        assert_eq!(session.store().load(), None);
    }

    #[tokio::test]
    async fn test_restore_network_failure_clears_credential() {
        let api = FakeApi::new();
        api.fail_check();
        let mut session = controller_with_token("tok");

        assert!(!session.restore(&api).await);
        assert_eq!(session.state(), SessionState::Anonymous);
        assert_eq!(session.store().load(), None);
    }

    #[tokio::test]
    async fn test_sign_in_success_persists_token() {
        let api = FakeApi::new();
        let mut session = SessionController::new(MemoryCredentialStore::new());

        session
            .sign_in(&api, &LoginForm::new(" admin@example.com ", "pw"))
            .await
            .unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.store().load().as_deref(), Some(FakeApi::TOKEN));
        assert_eq!(session.context().map(|c| c.token()), Some(FakeApi::TOKEN));
        assert_eq!(
            api.calls(),
            vec![Call::SignIn("admin@example.com".into())]
        );
    }

    #[tokio::test]
    async fn test_sign_in_failure_leaves_store_untouched() {
        let api = FakeApi::new();
        api.reject_sign_in("登入失敗");
        let store = MemoryCredentialStore::new();
        let expired_at = Utc::now() - Duration::minutes(5);
        store.save("previous", expired_at).unwrap();
        let before = store.stored();
        let mut session = SessionController::new(store);

        let err = session
            .sign_in(&api, &LoginForm::new("admin", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Rejected(ref m) if m == "登入失敗"));
        assert_eq!(session.state(), SessionState::Anonymous);
        assert_eq!(session.store().stored(), before);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_sign_out_clears_everything() {
        let api = FakeApi::new();
        let mut session = controller_with_token("tok");
        session.restore(&api).await;
        let mut form = LoginForm::new("admin", "pw");

        session.sign_out(&api, &mut form).await.unwrap();

        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.context().is_none());
        assert_eq!(session.store().load(), None);
        assert_eq!(form, LoginForm::default());
        assert_eq!(api.calls().last(), Some(&Call::Logout("tok".into())));
    }

    #[tokio::test]
    async fn test_sign_out_when_logout_fails_still_clears() {
        let api = FakeApi::new();
        api.fail_logout();
        let mut session = controller_with_token("tok");
        session.restore(&api).await;
        let mut form = LoginForm::new("admin", "pw");

        let err = session.sign_out(&api, &mut form).await.unwrap_err();

        assert!(matches!(err, AuthError::Logout(_)));
        assert_eq!(session.state(), SessionState::Anonymous);
        assert_eq!(session.store().load(), None);
        assert!(session.store().stored().is_none());
        assert_eq!(form, LoginForm::default());
    }

    #[test]
    fn test_login_form() {
        assert!(!LoginForm::default().is_complete());
        assert!(!LoginForm::new("  ", "pw").is_complete());
        assert!(LoginForm::new("a", "pw").is_complete());
        assert!(!format!("{:?}", LoginForm::new("a", "hunter2")).contains("hunter2"));
    }
}
