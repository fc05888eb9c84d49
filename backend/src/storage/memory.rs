//! # In-Memory Store
//!
//! A process-local stand-in for the hosted store. It follows the hosted
//! store's observable behaviour (generated ids, unverified sign-ups,
//! token-resolved identities, update-by-id) and lets callers inject
//! failures, which makes it the fixture for every service test as well as a
//! backend for local runs (`CARE_STORE=memory`).

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::{RecordId, UserIdentity};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CareError, CareResult};
use crate::storage::traits::{AuthGrant, AuthProvider, TableStore};

struct Account {
    password: String,
    identity: UserIdentity,
    confirmed: bool,
}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, UserIdentity>,
    tables: HashMap<String, Vec<Map<String, Value>>>,
    next_id: RecordId,
    failing_selects: HashSet<String>,
    failing_inserts: HashSet<String>,
    failing_updates: HashSet<(String, RecordId)>,
    token_session_calls: usize,
    update_calls: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CareResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| CareError::Store("memory store lock poisoned".to_string()))
    }

    fn guard(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an already verified account
    pub fn add_user(&self, email: &str, password: &str) -> UserIdentity {
        let identity = UserIdentity {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        self.guard().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: identity.clone(),
                confirmed: true,
            },
        );
        identity
    }

    /// Mark a signed-up account as verified
    pub fn confirm_user(&self, email: &str) -> bool {
        match self.guard().accounts.get_mut(email) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Make `token` resolve to `identity`, as an OAuth redirect would
    pub fn issue_token(&self, token: &str, identity: UserIdentity) {
        self.guard().tokens.insert(token.to_string(), identity);
    }

    pub fn fail_select(&self, table: &str) {
        self.guard().failing_selects.insert(table.to_string());
    }

    pub fn fail_insert(&self, table: &str) {
        self.guard().failing_inserts.insert(table.to_string());
    }

    pub fn fail_update(&self, table: &str, id: RecordId) {
        self.guard().failing_updates.insert((table.to_string(), id));
    }

    /// How many times the token-to-session call reached the store
    pub fn token_session_calls(&self) -> usize {
        self.guard().token_session_calls
    }

    pub fn update_calls(&self) -> usize {
        self.guard().update_calls
    }

    /// Snapshot of the rows currently held in `table`
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.guard()
            .tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuthProvider for MemoryStore {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> CareResult<AuthGrant> {
        let mut state = self.lock()?;
        let identity = match state.accounts.get(email) {
            Some(account) if account.password == password && account.confirmed => {
                account.identity.clone()
            }
            Some(account) if account.password == password => {
                return Err(CareError::Auth("Email not confirmed".to_string()));
            }
            _ => return Err(CareError::Auth("Invalid login credentials".to_string())),
        };

        let access_token = format!("memory-{}", Uuid::new_v4());
        state.tokens.insert(access_token.clone(), identity.clone());
        debug!("Issued in-memory access token for {}", identity.id);

        Ok(AuthGrant {
            user: identity,
            access_token,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> CareResult<()> {
        let mut state = self.lock()?;
        if state.accounts.contains_key(email) {
            return Err(CareError::Auth("User already registered".to_string()));
        }
        state.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: UserIdentity {
                    id: Uuid::new_v4().to_string(),
                    email: Some(email.to_string()),
                },
                confirmed: false,
            },
        );
        Ok(())
    }

    async fn set_session_from_token(&self, token: &str) -> CareResult<UserIdentity> {
        let mut state = self.lock()?;
        state.token_session_calls += 1;
        state
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| CareError::Auth("Invalid or expired token".to_string()))
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str) -> CareResult<String> {
        let url = reqwest::Url::parse_with_params(
            "memory://auth/v1/authorize",
            &[("provider", provider), ("redirect_to", redirect_to)],
        )
        .map_err(|e| CareError::Store(e.to_string()))?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select_all(&self, table: &str, _bearer: Option<&str>) -> CareResult<Vec<Value>> {
        let state = self.lock()?;
        if state.failing_selects.contains(table) {
            return Err(CareError::Store(format!("select on '{}' failed", table)));
        }
        Ok(state
            .tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, fields: Value, _bearer: Option<&str>) -> CareResult<Value> {
        let mut state = self.lock()?;
        if state.failing_inserts.contains(table) {
            return Err(CareError::Store(format!("insert into '{}' failed", table)));
        }
        let Value::Object(mut row) = fields else {
            return Err(CareError::Store("insert payload must be a JSON object".to_string()));
        };

        state.next_id += 1;
        let id = state.next_id;
        row.insert("id".to_string(), Value::from(id));
        state.tables.entry(table.to_string()).or_default().push(row.clone());

        Ok(Value::Object(row))
    }

    async fn update(
        &self,
        table: &str,
        fields: Value,
        id: RecordId,
        _bearer: Option<&str>,
    ) -> CareResult<()> {
        let mut state = self.lock()?;
        state.update_calls += 1;
        if state.failing_updates.contains(&(table.to_string(), id)) {
            return Err(CareError::Store(format!("update of '{}' row {} failed", table, id)));
        }
        let Value::Object(changes) = fields else {
            return Err(CareError::Store("update payload must be a JSON object".to_string()));
        };

        let row = state
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row.get("id") == Some(&Value::from(id))))
            .ok_or_else(|| CareError::Store(format!("no '{}' row with id {}", table, id)))?;
        row.extend(changes);

        Ok(())
    }
}
