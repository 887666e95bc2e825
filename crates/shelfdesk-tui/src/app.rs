//! Application state management for shelfdesk.
//!
//! This module contains the `App` struct that holds UI state on top of the
//! core `Console`, and coordinates background page fetches.

use std::path::PathBuf;

use anyhow::Result;
use shelfdesk_core::api::ApiClient;
use shelfdesk_core::config::ENV_PASSWORD;
use shelfdesk_core::{
    Config, Console, ConsoleError, CredentialStore, DraftField, FetchOutcome, FetchRequest,
    Product, ProductDraft,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background fetch channel.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for a single editor field.
const MAX_FIELD_LENGTH: usize = 2000;

pub type AppConsole = Console<ApiClient, Box<dyn CredentialStore>>;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    LoggingIn,
    Normal,
    Editing,
    ConfirmingDelete,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Product editor overlay state.
#[derive(Debug, Clone)]
pub struct Editor {
    /// `None` when creating a new product.
    pub product_id: Option<String>,
    pub draft: ProductDraft,
    pub focus: DraftField,
    pub error: Option<String>,
}

impl Editor {
    pub fn create() -> Self {
        Self {
            product_id: None,
            draft: ProductDraft::default(),
            focus: DraftField::ALL[0],
            error: None,
        }
    }

    pub fn edit(product: &Product) -> Self {
        Self {
            product_id: Some(product.id.clone()),
            draft: ProductDraft::from_product(product),
            focus: DraftField::ALL[0],
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.product_id.is_some() {
            " Edit product "
        } else {
            " New product "
        }
    }

    /// Type a character into the focused field.
    pub fn push_char(&mut self, c: char) {
        if self.focus == DraftField::Enabled {
            if c == ' ' {
                self.draft.toggle_enabled();
            }
            return;
        }
        let numeric = self.focus.is_numeric();
        if let Some(text) = self.draft.text_mut(self.focus) {
            if can_add_field_char(text.chars().count(), c, numeric) {
                text.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.draft.text_mut(self.focus) {
            text.pop();
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    config_path: PathBuf,
    pub console: AppConsole,

    // UI State
    pub state: AppState,
    pub selection: usize,
    pub editor: Option<Editor>,
    /// Product awaiting delete confirmation: (id, title)
    pub pending_delete: Option<(String, String)>,
    pub status_message: Option<String>,

    // Login form state
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Background fetch channel
    fetch_tx: mpsc::Sender<FetchOutcome>,
    fetch_rx: mpsc::Receiver<FetchOutcome>,
}

impl App {
    /// Create a new application instance from a loaded config
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config.api_base, config.api_path()?)?;
        let store = config.credential_store()?;
        debug!(base = %config.api_base, backend = ?config.credential_backend, "App configured");
        let mut app = Self::with_console(config, Config::config_path()?, Console::new(api, store));
        if let Ok(password) = std::env::var(ENV_PASSWORD) {
            app.console.login.password = password;
        }
        Ok(app)
    }

    pub fn with_console(config: Config, config_path: PathBuf, mut console: AppConsole) -> Self {
        if let Some(ref username) = config.last_username {
            console.login.username = username.clone();
        }

        let (fetch_tx, fetch_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            config,
            config_path,
            console,
            state: AppState::LoggingIn,
            selection: 0,
            editor: None,
            pending_delete: None,
            status_message: None,
            login_focus: LoginFocus::Username,
            login_error: None,
            fetch_tx,
            fetch_rx,
        }
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.console.pager().products().get(self.selection)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Validate a stored credential; show the login form if there is none.
    pub async fn startup(&mut self) {
        match self.console.resume().await {
            Some(request) => {
                info!("Resumed stored session");
                self.state = AppState::Normal;
                self.spawn_fetch(Some(request));
            }
            None => self.start_login(),
        }
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.console.login.username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        if self.console.is_busy() {
            return;
        }
        if !self.console.login.is_complete() {
            self.login_error = Some("Username and password required".to_string());
            return;
        }

        self.login_error = None;
        let username = self.console.login.username.trim().to_string();

        match self.console.authenticate().await {
            Ok(request) => {
                if let Err(e) = Config::remember_username(&self.config_path, &username) {
                    warn!(error = %e, "Failed to save config");
                }
                self.config.last_username = Some(username);

                self.state = AppState::Normal;
                self.selection = 0;
                self.status_message = None;
                self.spawn_fetch(request);
                info!("Login successful");
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(e.user_message());
            }
        }
    }

    pub async fn logout(&mut self) {
        if let Err(e) = self.console.sign_out().await {
            self.status_message = Some(e.user_message());
        }
        self.selection = 0;
        self.editor = None;
        self.pending_delete = None;
        if let Some(ref username) = self.config.last_username {
            self.console.login.username = username.clone();
        }
        self.start_login();
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Run a page fetch on a background task; the result arrives through
    /// `check_background_tasks`.
    pub fn spawn_fetch(&self, request: Option<FetchRequest>) {
        let Some(request) = request else {
            return;
        };
        let api = self.console.api().clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let outcome = request.send(&api).await;
            if tx.send(outcome).await.is_err() {
                debug!("Fetch result receiver dropped");
            }
        });
    }

    /// Check for completed background fetches and apply them
    pub fn check_background_tasks(&mut self) {
        while let Ok(outcome) = self.fetch_rx.try_recv() {
            self.process_fetch_outcome(outcome);
        }
    }

    fn process_fetch_outcome(&mut self, outcome: FetchOutcome) {
        let page = outcome.ticket.page();
        let failure = outcome.result.as_ref().err().map(|e| e.to_string());

        if self.console.apply_fetch(outcome) {
            self.clamp_selection();
        } else if let Some(message) = failure {
            self.status_message = Some(format!("Failed to load page {}: {}", page, message));
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.console.pager().products().len();
        self.selection = self.selection.min(len.saturating_sub(1));
    }

    pub fn refresh(&mut self) {
        self.status_message = None;
        let request = self.console.request_fetch();
        self.spawn_fetch(request);
    }

    /// Arrow keys follow the strip's arrows: inert while greyed out.
    pub fn next_page(&mut self) {
        if !self.console.pager().descriptor().has_next {
            return;
        }
        let request = self.console.next();
        self.on_page_change(request);
    }

    pub fn previous_page(&mut self) {
        if !self.console.pager().descriptor().has_previous {
            return;
        }
        let request = self.console.previous();
        self.on_page_change(request);
    }

    /// Jump to the `slot`-th (1-based) page number of the visible strip.
    pub fn select_strip_page(&mut self, slot: u32) {
        if let Some(page) = strip_page(self.console.pager().visible_pages(), slot) {
            let request = self.console.set_page(page);
            self.on_page_change(request);
        }
    }

    fn on_page_change(&mut self, request: Option<FetchRequest>) {
        if request.is_some() {
            self.selection = 0;
            self.status_message = None;
        }
        self.spawn_fetch(request);
    }

    pub fn select_next(&mut self) {
        let max_index = self.console.pager().products().len().saturating_sub(1);
        self.selection = (self.selection + 1).min(max_index);
    }

    pub fn select_previous(&mut self) {
        self.selection = self.selection.saturating_sub(1);
    }

    // =========================================================================
    // Product editing
    // =========================================================================

    pub fn open_new_product(&mut self) {
        self.editor = Some(Editor::create());
        self.state = AppState::Editing;
    }

    pub fn open_selected_product(&mut self) {
        if let Some(product) = self.selected_product() {
            self.editor = Some(Editor::edit(product));
            self.state = AppState::Editing;
        }
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
        self.state = AppState::Normal;
    }

    pub async fn submit_editor(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };

        match self
            .console
            .save_product(editor.product_id.as_deref(), &editor.draft)
            .await
        {
            Ok(message) => {
                self.status_message = Some(message);
                self.close_editor();
                self.clamp_selection();
            }
            Err(e) => {
                warn!(error = %e, "Failed to save product");
                editor.error = Some(e.to_string());
                if matches!(e, ConsoleError::NotSignedIn) {
                    self.close_editor();
                    self.start_login();
                }
            }
        }
    }

    pub fn confirm_delete_selected(&mut self) {
        if let Some(product) = self.selected_product() {
            self.pending_delete = Some((product.id.clone(), product.title.clone()));
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub async fn delete_pending(&mut self) {
        self.state = AppState::Normal;
        let Some((id, title)) = self.pending_delete.take() else {
            return;
        };

        match self.console.delete_product(&id).await {
            Ok(message) => {
                self.status_message = Some(message);
                self.clamp_selection();
            }
            Err(e) => {
                warn!(error = %e, id, "Failed to delete product");
                self.status_message = Some(format!("Could not delete {}: {}", title, e));
            }
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Check if an editor character should be accepted. Price fields only take
/// digits and a decimal point.
pub fn can_add_field_char(current_len: usize, c: char, numeric: bool) -> bool {
    if current_len >= MAX_FIELD_LENGTH || !is_valid_input_char(c) {
        return false;
    }
    !numeric || c.is_ascii_digit() || c == '.'
}

/// Page number shown at 1-based `slot` of the strip, if any.
pub fn strip_page(visible: std::ops::RangeInclusive<u32>, slot: u32) -> Option<u32> {
    if slot == 0 {
        return None;
    }
    let page = visible.start() + slot - 1;
    visible.contains(&page).then_some(page)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shelfdesk_core::MemoryCredentialStore;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_for(base_url: &str, config_dir: &tempfile::TempDir) -> App {
        let api = ApiClient::new(base_url, "shop").unwrap();
        let store: Box<dyn CredentialStore> = Box::new(MemoryCredentialStore::new());
        let config = Config {
            last_username: Some("admin@example.com".to_string()),
            ..Default::default()
        };
        let config_path = config_dir.path().join("config.json");
        App::with_console(config, config_path, Console::new(api, store))
    }

    fn app(config_dir: &tempfile::TempDir) -> App {
        app_for("http://127.0.0.1:9", config_dir)
    }

    async fn mount_sign_in(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/admin/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "登入成功",
                "uid": "u1",
                "token": "tok-123",
                "expired": 4102444800000i64
            })))
            .mount(server)
            .await;
    }

    /// Wait for one background fetch and apply it.
    async fn drain_one(app: &mut App) {
        let outcome = app.fetch_rx.recv().await.unwrap();
        app.process_fetch_outcome(outcome);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(49, '@'));
        assert!(!can_add_username_char(50, 'a'));
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
        assert!(!can_add_username_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_can_add_field_char() {
        assert!(can_add_field_char(0, '蘋', false));
        assert!(can_add_field_char(0, '7', true));
        assert!(can_add_field_char(0, '.', true));
        assert!(!can_add_field_char(0, 'x', true));
        assert!(!can_add_field_char(0, '-', true));
        assert!(!can_add_field_char(MAX_FIELD_LENGTH, 'a', false));
    }

    #[test]
    fn test_strip_page() {
        assert_eq!(strip_page(1..=5, 1), Some(1));
        assert_eq!(strip_page(6..=10, 3), Some(8));
        assert_eq!(strip_page(11..=12, 2), Some(12));
        assert_eq!(strip_page(11..=12, 3), None);
        assert_eq!(strip_page(1..=5, 0), None);
    }

    // -------------------------------------------------------------------------
    // Editor Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_editor_typing() {
        let mut editor = Editor::create();
        editor.focus = DraftField::Title;
        editor.push_char('K');
        editor.push_char('i');
        editor.backspace();
        assert_eq!(editor.draft.title, "K");

        editor.focus = DraftField::Price;
        for c in "1a2.5".chars() {
            editor.push_char(c);
        }
        assert_eq!(editor.draft.price, "12.5");

        editor.focus = DraftField::Enabled;
        editor.push_char('x');
        assert!(!editor.draft.is_enabled);
        editor.push_char(' ');
        assert!(editor.draft.is_enabled);
    }

    #[test]
    fn test_editor_title() {
        assert_eq!(Editor::create().title(), " New product ");
        let product = Product {
            id: "p1".to_string(),
            ..Default::default()
        };
        let editor = Editor::edit(&product);
        assert_eq!(editor.product_id.as_deref(), Some("p1"));
        assert_eq!(editor.title(), " Edit product ");
    }

    // -------------------------------------------------------------------------
    // App Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_startup_without_credential_shows_login() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        assert_eq!(app.console.login.username, "admin@example.com");

        app.startup().await;
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_focus, LoginFocus::Password);
    }

    #[tokio::test]
    async fn test_logout_keeps_last_username() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        assert!(app.console.login.password.is_empty());
        app.console.login.password = "secret".to_string();
        app.state = AppState::Normal;

        app.logout().await;
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.console.login.username, "admin@example.com");
        assert!(app.console.login.password.is_empty());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_attempt_login_requires_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.console.login.password.clear();

        app.attempt_login().await;
        assert_eq!(app.login_error.as_deref(), Some("Username and password required"));
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[tokio::test]
    async fn test_login_fetches_first_page_in_background() {
        let server = MockServer::start().await;
        mount_sign_in(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/shop/admin/products"))
            .and(query_param("page", "1"))
            .and(header("authorization", "tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "products": [
                    {"id": "a", "title": "Apple", "category": "Fruit", "unit": "kg",
                     "origin_price": 100, "price": 80, "is_enabled": 1},
                    {"id": "b", "title": "Banana", "category": "Fruit", "unit": "kg",
                     "origin_price": 50, "price": 40, "is_enabled": 0}
                ],
                "pagination": {"total_pages": 3, "current_page": 1,
                               "has_pre": false, "has_next": true, "category": ""}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut app = app_for(&server.uri(), &dir);
        app.console.login.password = "secret".to_string();
        app.selection = 4;

        app.attempt_login().await;
        assert_eq!(app.state, AppState::Normal);
        assert!(app.login_error.is_none());

        drain_one(&mut app).await;
        assert_eq!(app.console.pager().products().len(), 2);
        assert_eq!(app.console.pager().total_pages(), 3);
        assert_eq!(app.selected_product().map(|p| p.id.as_str()), Some("a"));

        let saved = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(saved.last_username.as_deref(), Some("admin@example.com"));
    }

    #[tokio::test]
    async fn test_failed_page_fetch_sets_status() {
        let server = MockServer::start().await;
        mount_sign_in(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/shop/admin/products"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut app = app_for(&server.uri(), &dir);
        app.console.login.password = "secret".to_string();

        app.attempt_login().await;
        drain_one(&mut app).await;

        let status = app.status_message.clone().unwrap();
        assert!(status.starts_with("Failed to load page 1"));
        assert!(app.console.pager().products().is_empty());
        assert!(app.console.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_login_shows_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/signin"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "success": false,
                "message": "登入失敗",
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut app = app_for(&server.uri(), &dir);
        app.console.login.password = "wrong".to_string();

        app.attempt_login().await;
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_error.as_deref(), Some("Login failed: 登入失敗"));
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_editor_needs_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.open_selected_product();
        assert!(app.editor.is_none());
        app.confirm_delete_selected();
        assert!(app.pending_delete.is_none());

        app.open_new_product();
        assert_eq!(app.state, AppState::Editing);
        app.close_editor();
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_navigation_signed_out_stays_put() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.previous_page();
        assert_eq!(app.console.pager().current_page(), 1);
        app.select_strip_page(2);
        assert_eq!(app.console.pager().current_page(), 1);
    }
}
