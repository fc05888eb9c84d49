//! # Supabase Store
//!
//! HTTP client for the hosted store: GoTrue for authentication and PostgREST
//! for table access. Every request carries the project's `apikey`; table
//! requests additionally carry the caller's bearer token so row level
//! security applies to the signed-in user.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{RecordId, UserIdentity};
use tracing::{debug, warn};

use crate::error::{CareError, CareResult};
use crate::storage::traits::{AuthGrant, AuthProvider, TableStore};

#[derive(Deserialize)]
struct TokenGrant {
    access_token: String,
    user: UserIdentity,
}

/// GoTrue and PostgREST report errors under different keys
#[derive(Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str) -> CareResult<Self> {
        let client = Client::builder()
            .user_agent("care-records")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, url: &str, bearer: Option<&str>) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer.unwrap_or(&self.api_key))
    }

    /// Turns a non-success response into an error, using `classify` to pick
    /// between authentication and store failures.
    async fn check(
        response: Response,
        classify: fn(String) -> CareError,
    ) -> CareResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| format!("HTTP {}", status));
        warn!("Store responded with {}: {}", status, message);

        if status.is_client_error() {
            Err(classify(message))
        } else {
            Err(CareError::Store(message))
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseStore {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> CareResult<AuthGrant> {
        debug!("Password sign-in request");
        let response = self
            .request(Method::POST, &self.auth_url("token?grant_type=password"), None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let grant: TokenGrant = Self::check(response, CareError::Auth).await?.json().await?;

        Ok(AuthGrant {
            user: grant.user,
            access_token: grant.access_token,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> CareResult<()> {
        debug!("Sign-up request");
        let response = self
            .request(Method::POST, &self.auth_url("signup"), None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Self::check(response, CareError::Auth).await?;
        Ok(())
    }

    async fn set_session_from_token(&self, token: &str) -> CareResult<UserIdentity> {
        debug!("Resolving session from bearer token");
        let response = self
            .request(Method::GET, &self.auth_url("user"), Some(token))
            .send()
            .await?;
        Ok(Self::check(response, CareError::Auth).await?.json().await?)
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str) -> CareResult<String> {
        let url = Url::parse_with_params(
            &self.auth_url("authorize"),
            &[("provider", provider), ("redirect_to", redirect_to)],
        )
        .map_err(|e| CareError::Store(e.to_string()))?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl TableStore for SupabaseStore {
    async fn select_all(&self, table: &str, bearer: Option<&str>) -> CareResult<Vec<Value>> {
        let url = format!("{}?select=*", self.table_url(table));
        let response = self.request(Method::GET, &url, bearer).send().await?;
        Ok(Self::check(response, CareError::Store).await?.json().await?)
    }

    async fn insert(&self, table: &str, fields: Value, bearer: Option<&str>) -> CareResult<Value> {
        let response = self
            .request(Method::POST, &self.table_url(table), bearer)
            .header("Prefer", "return=representation")
            .json(&fields)
            .send()
            .await?;
        let rows: Vec<Value> = Self::check(response, CareError::Store).await?.json().await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| CareError::Store(format!("insert into '{}' returned no row", table)))
    }

    async fn update(
        &self,
        table: &str,
        fields: Value,
        id: RecordId,
        bearer: Option<&str>,
    ) -> CareResult<()> {
        let url = format!("{}?id=eq.{}", self.table_url(table), id);
        let response = self
            .request(Method::PATCH, &url, bearer)
            .header("Prefer", "return=representation")
            .json(&fields)
            .send()
            .await?;
        let rows: Vec<Value> = Self::check(response, CareError::Store).await?.json().await?;

        if rows.is_empty() {
            return Err(CareError::Store(format!("no '{}' row with id {}", table, id)));
        }
        Ok(())
    }
}
