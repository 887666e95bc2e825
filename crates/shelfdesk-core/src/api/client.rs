//! API client for the product catalogue admin REST API.
//!
//! This module provides the `AdminApi` trait (the seam the session and
//! listing controllers are written against) and `ApiClient`, its `reqwest`
//! implementation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{ProductPage, ProductPayload, ProductsResponse};

use super::error::message_text;
use super::{ApiError, AuthContext};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL of the catalogue API.
pub const DEFAULT_API_BASE: &str = "https://ec-course-api.hexschool.io/v2";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Token and expiry handed out by a successful sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct SignInGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    token: Option<String>,
    /// Expiry as milliseconds since the Unix epoch.
    #[serde(default)]
    expired: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<serde_json::Value>,
}

impl StatusResponse {
    fn message(&self) -> String {
        self.message.as_ref().map(message_text).unwrap_or_default()
    }

    /// Turn `success: false` into an error, returning the message otherwise.
    fn into_result(self) -> Result<String, ApiError> {
        let message = self.message();
        if self.success {
            Ok(message)
        } else {
            Err(ApiError::Rejected(message))
        }
    }
}

/// Operations of the admin API used by the console.
///
/// Every call that needs a session takes an explicit `AuthContext`.
#[trait_variant::make(AdminApi: Send)]
pub trait LocalAdminApi {
    /// Exchange username/password for a token.
    async fn sign_in(&self, username: &str, password: &str) -> Result<SignInGrant, ApiError>;

    /// Ask the server whether the token is still valid.
    async fn check(&self, ctx: &AuthContext) -> Result<bool, ApiError>;

    /// Revoke the token server-side.
    async fn logout(&self, ctx: &AuthContext) -> Result<(), ApiError>;

    /// Fetch one page of the admin product listing.
    async fn list_products(&self, ctx: &AuthContext, page: u32) -> Result<ProductPage, ApiError>;

    /// Create a product; returns the server's message.
    async fn create_product(
        &self,
        ctx: &AuthContext,
        payload: &ProductPayload,
    ) -> Result<String, ApiError>;

    /// Replace the product with the given id; returns the server's message.
    async fn update_product(
        &self,
        ctx: &AuthContext,
        id: &str,
        payload: &ProductPayload,
    ) -> Result<String, ApiError>;

    /// Delete the product with the given id; returns the server's message.
    async fn delete_product(&self, ctx: &AuthContext, id: &str) -> Result<String, ApiError>;
}

/// API client for the catalogue admin API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_path: String,
}

impl ApiClient {
    /// Create a new API client for `base_url` and the shop identified by `api_path`.
    pub fn new(base_url: &str, api_path: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_path: api_path.trim_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/api/{}/admin{}", self.base_url, self.api_path, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn post_status(&self, ctx: &AuthContext, url: &str) -> Result<StatusResponse, ApiError> {
        let response = ctx.authorize(self.client.post(url)).send().await?;
        Self::parse_json(response, url).await
    }
}

impl AdminApi for ApiClient {
    async fn sign_in(&self, username: &str, password: &str) -> Result<SignInGrant, ApiError> {
        let url = self.url("/admin/signin");

        let response = self
            .client
            .post(&url)
            .json(&SignInRequest { username, password })
            .send()
            .await?;

        let auth: SignInResponse = Self::parse_json(response, &url).await?;

        if auth.success == Some(false) {
            let message = auth.message.as_ref().map(message_text).unwrap_or_default();
            return Err(ApiError::Rejected(message));
        }

        let token = auth
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("Sign-in response has no token".to_string()))?;
        let expires_at = auth
            .expired
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| {
                ApiError::InvalidResponse("Sign-in response has no valid expiry".to_string())
            })?;

        debug!(%expires_at, "Signed in");
        Ok(SignInGrant { token, expires_at })
    }

    async fn check(&self, ctx: &AuthContext) -> Result<bool, ApiError> {
        let url = self.url("/api/user/check");
        let status = self.post_status(ctx, &url).await?;
        Ok(status.success)
    }

    async fn logout(&self, ctx: &AuthContext) -> Result<(), ApiError> {
        let url = self.url("/logout");
        self.post_status(ctx, &url).await?.into_result()?;
        Ok(())
    }

    async fn list_products(&self, ctx: &AuthContext, page: u32) -> Result<ProductPage, ApiError> {
        let url = self.admin_url("/products");

        let response = ctx
            .authorize(self.client.get(&url))
            .query(&[("page", page)])
            .send()
            .await?;

        let parsed: ProductsResponse = Self::parse_json(response, &url).await?;
        debug!(page, count = parsed.products.len(), "Products page received");
        Ok(parsed.into())
    }

    async fn create_product(
        &self,
        ctx: &AuthContext,
        payload: &ProductPayload,
    ) -> Result<String, ApiError> {
        let url = self.admin_url("/product");
        let response = ctx
            .authorize(self.client.post(&url))
            .json(payload)
            .send()
            .await?;
        Self::parse_json::<StatusResponse>(response, &url)
            .await?
            .into_result()
    }

    async fn update_product(
        &self,
        ctx: &AuthContext,
        id: &str,
        payload: &ProductPayload,
    ) -> Result<String, ApiError> {
        let url = self.admin_url(&format!("/product/{}", id));
        let response = ctx
            .authorize(self.client.put(&url))
            .json(payload)
            .send()
            .await?;
        Self::parse_json::<StatusResponse>(response, &url)
            .await?
            .into_result()
    }

    async fn delete_product(&self, ctx: &AuthContext, id: &str) -> Result<String, ApiError> {
        let url = self.admin_url(&format!("/product/{}", id));
        let response = ctx.authorize(self.client.delete(&url)).send().await?;
        Self::parse_json::<StatusResponse>(response, &url)
            .await?
            .into_result()
    }
}
