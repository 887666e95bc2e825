//! In-process fake of the admin API for controller tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{Duration, Utc};

use crate::api::{AdminApi, ApiError, AuthContext, SignInGrant};
use crate::models::{PageDescriptor, Product, ProductPage, ProductPayload};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SignIn(String),
    Check(String),
    Logout(String),
    List(u32),
    Create(String),
    Update(String),
    Delete(String),
}

#[derive(Clone, Copy, PartialEq)]
enum CheckMode {
    Valid,
    Invalid,
    Fail,
}

struct FakeState {
    calls: Vec<Call>,
    check: CheckMode,
    sign_in_rejection: Option<String>,
    logout_fails: bool,
    mutations_fail: bool,
    total_pages: u32,
    list_failures: VecDeque<String>,
}

pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub const TOKEN: &'static str = "fake-token";

    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                calls: Vec::new(),
                check: CheckMode::Valid,
                sign_in_rejection: None,
                logout_fails: false,
                mutations_fail: false,
                total_pages: 12,
                list_failures: VecDeque::new(),
            }),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().expect("fake api lock");
        f(&mut state)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn list_calls(&self) -> Vec<u32> {
        self.with(|s| {
            s.calls
                .iter()
                .filter_map(|c| match c {
                    Call::List(page) => Some(*page),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn reject_token(&self) {
        self.with(|s| s.check = CheckMode::Invalid);
    }

    pub fn fail_check(&self) {
        self.with(|s| s.check = CheckMode::Fail);
    }

    pub fn reject_sign_in(&self, message: &str) {
        self.with(|s| s.sign_in_rejection = Some(message.to_string()));
    }

    pub fn fail_logout(&self) {
        self.with(|s| s.logout_fails = true);
    }

    pub fn fail_mutations(&self) {
        self.with(|s| s.mutations_fail = true);
    }

    pub fn set_total_pages(&self, total_pages: u32) {
        self.with(|s| s.total_pages = total_pages);
    }

    /// Make the next listing call fail.
    pub fn fail_next_list(&self) {
        self.with(|s| s.list_failures.push_back("listing unavailable".to_string()));
    }

    /// The page the fake serves for `page` out of `total_pages`.
    pub fn page(page: u32, total_pages: u32) -> ProductPage {
        ProductPage {
            products: vec![Product {
                id: format!("p{}", page),
                title: format!("Product {}", page),
                category: "Test".to_string(),
                is_enabled: true,
                ..Default::default()
            }],
            pagination: PageDescriptor {
                total_pages,
                has_previous: page > 1,
                has_next: page < total_pages,
                category: String::new(),
            },
        }
    }
}

impl AdminApi for FakeApi {
    async fn sign_in(&self, username: &str, _password: &str) -> Result<SignInGrant, ApiError> {
        self.with(|s| {
            s.calls.push(Call::SignIn(username.to_string()));
            match &s.sign_in_rejection {
                Some(message) => Err(ApiError::BadRequest(message.clone())),
                None => Ok(SignInGrant {
                    token: Self::TOKEN.to_string(),
                    expires_at: Utc::now() + Duration::days(7),
                }),
            }
        })
    }

    async fn check(&self, ctx: &AuthContext) -> Result<bool, ApiError> {
        self.with(|s| {
            s.calls.push(Call::Check(ctx.token().to_string()));
            match s.check {
                CheckMode::Valid => Ok(true),
                CheckMode::Invalid => Ok(false),
                CheckMode::Fail => Err(ApiError::ServerError("unavailable".to_string())),
            }
        })
    }

    async fn logout(&self, ctx: &AuthContext) -> Result<(), ApiError> {
        self.with(|s| {
            s.calls.push(Call::Logout(ctx.token().to_string()));
            if s.logout_fails {
                Err(ApiError::ServerError("logout unavailable".to_string()))
            } else {
                Ok(())
            }
        })
    }

    async fn list_products(&self, _ctx: &AuthContext, page: u32) -> Result<ProductPage, ApiError> {
        self.with(|s| {
            s.calls.push(Call::List(page));
            match s.list_failures.pop_front() {
                Some(message) => Err(ApiError::ServerError(message)),
                None => Ok(Self::page(page, s.total_pages)),
            }
        })
    }

    async fn create_product(
        &self,
        _ctx: &AuthContext,
        payload: &ProductPayload,
    ) -> Result<String, ApiError> {
        self.with(|s| {
            s.calls.push(Call::Create(payload.data.title.clone()));
            if s.mutations_fail {
                Err(ApiError::Rejected("create refused".to_string()))
            } else {
                Ok("created".to_string())
            }
        })
    }

    async fn update_product(
        &self,
        _ctx: &AuthContext,
        id: &str,
        _payload: &ProductPayload,
    ) -> Result<String, ApiError> {
        self.with(|s| {
            s.calls.push(Call::Update(id.to_string()));
            if s.mutations_fail {
                Err(ApiError::Rejected("update refused".to_string()))
            } else {
                Ok("updated".to_string())
            }
        })
    }

    async fn delete_product(&self, _ctx: &AuthContext, id: &str) -> Result<String, ApiError> {
        self.with(|s| {
            s.calls.push(Call::Delete(id.to_string()));
            if s.mutations_fail {
                Err(ApiError::Rejected("delete refused".to_string()))
            } else {
                Ok("deleted".to_string())
            }
        })
    }
}
