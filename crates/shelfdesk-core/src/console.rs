//! Orchestration of the session controller and the product pager.
//!
//! The console owns the API client, the session and the pager, and keeps the
//! rules that tie them together:
//!
//! - every transition into Authenticated fetches the current page
//! - every change of the current page fetches it again
//! - sign-out forgets the listing
//!
//! Navigation methods come in two flavours. `next`/`previous`/`set_page`
//! only update state and hand back a `FetchRequest` for the caller to run
//! (the TUI runs it on a background task). `next_page`/`previous_page`/
//! `goto_page` also send the request and apply the result inline.

use thiserror::Error;
use tracing::info;

use crate::api::{AdminApi, ApiError};
use crate::auth::{AuthError, CredentialStore, LoginForm, SessionController};
use crate::catalog::{FetchOutcome, FetchRequest, Pager};
use crate::models::{DraftError, ProductDraft};

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct Console<A, S> {
    api: A,
    session: SessionController<S>,
    pager: Pager,
    pub login: LoginForm,
}

impl<A: AdminApi, S: CredentialStore> Console<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            session: SessionController::new(store),
            pager: Pager::new(),
            login: LoginForm::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> &SessionController<S> {
        &self.session
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Any auth call or listing request outstanding.
    pub fn is_busy(&self) -> bool {
        self.session.is_busy() || self.pager.is_loading()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Resume a stored session. Returns the request for the current page if
    /// the stored credential is still accepted.
    pub async fn resume(&mut self) -> Option<FetchRequest> {
        if self.session.restore(&self.api).await {
            self.request_fetch()
        } else {
            None
        }
    }

    /// Resume a stored session and fetch the current page inline.
    pub async fn startup(&mut self) -> bool {
        match self.resume().await {
            Some(request) => {
                self.run(Some(request)).await;
                true
            }
            None => false,
        }
    }

    /// Sign in with `self.login`. Returns the request for the current page.
    pub async fn authenticate(&mut self) -> Result<Option<FetchRequest>, AuthError> {
        self.session.sign_in(&self.api, &self.login).await?;
        self.login.password.clear();
        Ok(self.request_fetch())
    }

    /// Sign in with `self.login` and fetch the current page inline.
    pub async fn sign_in(&mut self) -> Result<(), AuthError> {
        let request = self.authenticate().await?;
        self.run(request).await;
        Ok(())
    }

    /// Sign out. Always ends Anonymous with an empty listing; an error only
    /// reports that the remote logout did not go through.
    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        let result = self.session.sign_out(&self.api, &mut self.login).await;
        self.pager.reset();
        result
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Request for the current page, if signed in.
    pub fn request_fetch(&mut self) -> Option<FetchRequest> {
        self.pager.begin_fetch(self.session.context())
    }

    pub fn apply_fetch(&mut self, outcome: FetchOutcome) -> bool {
        self.pager.apply_fetch(outcome)
    }

    /// Fetch the current page inline. No-op (false) when not signed in.
    pub async fn refresh(&mut self) -> bool {
        let request = self.request_fetch();
        self.run(request).await
    }

    /// Run `step` on the pager and request the page if it changed.
    fn navigate(&mut self, step: impl FnOnce(&mut Pager)) -> Option<FetchRequest> {
        let before = self.pager.current_page();
        step(&mut self.pager);
        if self.pager.current_page() != before {
            self.request_fetch()
        } else {
            None
        }
    }

    pub fn next(&mut self) -> Option<FetchRequest> {
        self.navigate(Pager::next)
    }

    pub fn previous(&mut self) -> Option<FetchRequest> {
        self.navigate(Pager::previous)
    }

    pub fn set_page(&mut self, n: u32) -> Option<FetchRequest> {
        self.navigate(|pager| pager.set_page(n))
    }

    /// Send a request and apply its outcome.
    pub async fn run(&mut self, request: Option<FetchRequest>) -> bool {
        match request {
            Some(request) => {
                let outcome = request.send(&self.api).await;
                self.apply_fetch(outcome)
            }
            None => false,
        }
    }

    pub async fn next_page(&mut self) -> bool {
        let request = self.next();
        self.run(request).await
    }

    pub async fn previous_page(&mut self) -> bool {
        let request = self.previous();
        self.run(request).await
    }

    pub async fn goto_page(&mut self, n: u32) -> bool {
        let request = self.set_page(n);
        self.run(request).await
    }

    // =========================================================================
    // Product editing
    // =========================================================================

    /// Create (`id == None`) or update a product from a draft, then reload
    /// the current page.
    pub async fn save_product(
        &mut self,
        id: Option<&str>,
        draft: &ProductDraft,
    ) -> Result<String, ConsoleError> {
        let payload = draft.to_payload()?;
        let ctx = self.session.context().ok_or(ConsoleError::NotSignedIn)?;

        let message = match id {
            Some(id) => self.api.update_product(ctx, id, &payload).await?,
            None => self.api.create_product(ctx, &payload).await?,
        };
        info!(id = ?id, "Product saved");

        self.refresh().await;
        Ok(message)
    }

    /// Delete a product, then reload the current page.
    pub async fn delete_product(&mut self, id: &str) -> Result<String, ConsoleError> {
        let ctx = self.session.context().ok_or(ConsoleError::NotSignedIn)?;
        let message = self.api.delete_product(ctx, id).await?;
        info!(id, "Product deleted");

        self.refresh().await;
        Ok(message)
    }
}
