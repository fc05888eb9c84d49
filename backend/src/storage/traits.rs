//! # Storage Traits
//!
//! The remote data store is an external service. These traits describe the
//! slice of it the backend consumes, so the hosted implementation and the
//! in-memory one can be used interchangeably by the repository and the
//! session layer.

use async_trait::async_trait;
use serde_json::Value;
use shared::{RecordId, UserIdentity};

use crate::error::CareResult;

/// Result of a successful password sign-in
#[derive(Debug, Clone, PartialEq)]
pub struct AuthGrant {
    pub user: UserIdentity,
    pub access_token: String,
}

/// Password and token based authentication offered by the store
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange email and password for an identity and access token
    async fn sign_in_with_password(&self, email: &str, password: &str) -> CareResult<AuthGrant>;

    /// Register a new account. The account is not usable until the provider
    /// has verified it out of band.
    async fn sign_up(&self, email: &str, password: &str) -> CareResult<()>;

    /// Resolve a bearer token issued elsewhere (e.g. an OAuth redirect)
    async fn set_session_from_token(&self, token: &str) -> CareResult<UserIdentity>;

    /// Link that starts the provider's OAuth flow for `provider`
    fn authorize_url(&self, provider: &str, redirect_to: &str) -> CareResult<String>;
}

/// Table scoped row operations. Rows travel as JSON objects keyed by column.
///
/// `bearer` is the caller's access token; `None` means the anonymous key.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Every row of `table`, in store order
    async fn select_all(&self, table: &str, bearer: Option<&str>) -> CareResult<Vec<Value>>;

    /// Insert one row and return it as stored, including its generated id
    async fn insert(&self, table: &str, fields: Value, bearer: Option<&str>) -> CareResult<Value>;

    /// Apply `fields` to the row whose id is `id`
    async fn update(
        &self,
        table: &str,
        fields: Value,
        id: RecordId,
        bearer: Option<&str>,
    ) -> CareResult<()>;
}

/// The full remote store: authentication plus tables
pub trait RemoteStore: AuthProvider + TableStore {}

impl<T: AuthProvider + TableStore> RemoteStore for T {}
