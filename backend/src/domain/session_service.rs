//! # Session Manager
//!
//! Owns the authentication state of every client session and decides whether
//! a caller may reach the record workflows.
//!
//! ```text
//! ANONYMOUS --(password or token login)--> AUTHENTICATED --(logout)--> (session removed)
//! ```
//!
//! A session consumes at most one credential. Once `token_consumed` is set,
//! further token logins on that session are acknowledged without calling the
//! store, so a client that replays the same redirect token on every request
//! cannot re-authenticate. The flag lives in the server-side session entry,
//! never in client state.
//!
//! Anonymous sessions left unused for longer than the idle timeout are
//! evicted by a background sweeper; authenticated sessions end at logout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use shared::UserIdentity;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::form_fields::required_text;
use crate::error::{CareError, CareResult};
use crate::storage::RemoteStore;

/// Durable per-session authentication state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub authenticated: bool,
    pub user: Option<UserIdentity>,
    pub token_consumed: bool,
    /// Bearer token used for the session's store calls
    pub access_token: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn current_user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }
}

/// Outcome of a token login attempt
#[derive(Debug, Clone, PartialEq)]
pub struct TokenLogin {
    pub session_id: Uuid,
    pub state: SessionState,
    /// The session had already consumed a credential; the store was not called
    pub already_processed: bool,
    /// The caller should drop the token from its request state
    pub clear_token: bool,
}

/// OAuth providers offered on the login page
pub const OAUTH_PROVIDERS: &[&str] = &["google", "facebook"];

/// How long an anonymous session may sit unused before it is evicted
pub const DEFAULT_ANONYMOUS_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// How often the background sweeper looks for idle sessions
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One session: its state plus when it was last used, in milliseconds since
/// the service's epoch
#[derive(Default)]
struct SessionSlot {
    state: Mutex<SessionState>,
    last_seen_ms: AtomicU64,
}

type SessionEntry = Arc<SessionSlot>;

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn RemoteStore>,
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    oauth_redirect: String,
    epoch: Instant,
    anonymous_idle_timeout: Duration,
}

impl SessionService {
    pub fn new(store: Arc<dyn RemoteStore>, oauth_redirect: String) -> Self {
        Self {
            store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            oauth_redirect,
            epoch: Instant::now(),
            anonymous_idle_timeout: DEFAULT_ANONYMOUS_IDLE_TIMEOUT,
        }
    }

    pub fn with_anonymous_idle_timeout(mut self, timeout: Duration) -> Self {
        self.anonymous_idle_timeout = timeout;
        self
    }

    fn millis_since_epoch(&self, at: Instant) -> u64 {
        let elapsed = at.saturating_duration_since(self.epoch).as_millis();
        u64::try_from(elapsed).unwrap_or(u64::MAX)
    }

    fn touch(&self, entry: &SessionSlot) {
        entry
            .last_seen_ms
            .store(self.millis_since_epoch(Instant::now()), Ordering::Relaxed);
    }

    async fn entry(&self, session_id: Uuid) -> Option<SessionEntry> {
        let entry = self.sessions.read().await.get(&session_id).cloned()?;
        self.touch(&entry);
        Some(entry)
    }

    /// Existing entry for `session_id`, or a fresh anonymous one. The boolean
    /// is true when the entry was created by this call.
    async fn entry_or_create(&self, session_id: Option<Uuid>) -> (Uuid, SessionEntry, bool) {
        if let Some(id) = session_id {
            if let Some(entry) = self.entry(id).await {
                return (id, entry, false);
            }
        }

        let id = Uuid::new_v4();
        let entry = SessionEntry::default();
        self.touch(&entry);
        self.sessions.write().await.insert(id, entry.clone());
        info!("Opened session {}", id);
        (id, entry, true)
    }

    /// Drop anonymous sessions unused for longer than the idle timeout, as
    /// seen at `now`. Sessions locked by an in-flight login are kept.
    /// Returns how many were evicted.
    pub async fn evict_idle_sessions_at(&self, now: Instant) -> usize {
        let now_ms = self.millis_since_epoch(now);
        let timeout_ms = u64::try_from(self.anonymous_idle_timeout.as_millis()).unwrap_or(u64::MAX);

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            let idle_ms = now_ms.saturating_sub(entry.last_seen_ms.load(Ordering::Relaxed));
            if idle_ms <= timeout_ms {
                return true;
            }
            let keep = match entry.state.try_lock() {
                Ok(state) => state.is_authenticated(),
                Err(_) => true,
            };
            keep
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle anonymous session(s)", evicted);
        }
        evicted
    }

    /// Number of sessions currently held
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Periodically evict idle anonymous sessions for as long as the
    /// runtime lives
    pub fn start_sweeper(self) {
        tokio::spawn(async move {
            info!("Starting session sweeper");
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                self.evict_idle_sessions_at(Instant::now()).await;
            }
        });
    }

    async fn discard(&self, session_id: Uuid) {
        self.sessions.write().await.remove(&session_id);
    }

    /// Current state of a known session
    pub async fn get(&self, session_id: Uuid) -> CareResult<SessionState> {
        let entry = self
            .entry(session_id)
            .await
            .ok_or_else(|| CareError::SessionNotFound(session_id.to_string()))?;
        let state = entry.state.lock().await.clone();
        Ok(state)
    }

    /// State of an existing session, or a new anonymous one
    pub async fn open(&self, session_id: Option<Uuid>) -> (Uuid, SessionState) {
        let (id, entry, _) = self.entry_or_create(session_id).await;
        let state = entry.state.lock().await.clone();
        (id, state)
    }

    pub async fn is_authenticated(&self, session_id: Uuid) -> bool {
        match self.get(session_id).await {
            Ok(state) => state.is_authenticated(),
            Err(_) => false,
        }
    }

    pub async fn current_user(&self, session_id: Uuid) -> Option<UserIdentity> {
        self.get(session_id).await.ok().and_then(|state| state.user)
    }

    /// Guard for the record workflows
    pub async fn require_authenticated(&self, session_id: Option<Uuid>) -> CareResult<SessionState> {
        let id = session_id.ok_or(CareError::NotAuthenticated)?;
        let state = self.get(id).await.map_err(|_| CareError::NotAuthenticated)?;
        if !state.is_authenticated() {
            return Err(CareError::NotAuthenticated);
        }
        Ok(state)
    }

    /// Password login. On failure the session is left exactly as it was.
    pub async fn login_with_password(
        &self,
        session_id: Option<Uuid>,
        email: &str,
        password: &str,
    ) -> CareResult<(Uuid, SessionState)> {
        let email = required_text("email", email)?;
        if password.is_empty() {
            return Err(CareError::validation("password", "is required"));
        }

        let (id, entry, created) = self.entry_or_create(session_id).await;
        let mut state = entry.state.lock().await;

        match self.store.sign_in_with_password(&email, password).await {
            Ok(grant) => {
                state.authenticated = true;
                state.user = Some(grant.user);
                state.token_consumed = true;
                state.access_token = Some(grant.access_token);
                info!("Session {} authenticated with password", id);
                Ok((id, state.clone()))
            }
            Err(e) => {
                warn!("Password login failed for session {}: {}", id, e);
                drop(state);
                if created {
                    self.discard(id).await;
                }
                Err(e)
            }
        }
    }

    /// Establish the session from a bearer token, at most once per session.
    ///
    /// The session entry stays locked across the store call, so concurrent
    /// replays of the same token are serialised and only the first reaches
    /// the store.
    pub async fn login_with_token(&self, session_id: Option<Uuid>, token: &str) -> CareResult<TokenLogin> {
        let (id, entry, created) = self.entry_or_create(session_id).await;
        let mut state = entry.state.lock().await;

        if state.token_consumed {
            info!("Session {} already processed a credential, skipping token", id);
            return Ok(TokenLogin {
                session_id: id,
                state: state.clone(),
                already_processed: true,
                clear_token: true,
            });
        }

        let token = token.trim();
        if token.is_empty() {
            drop(state);
            if created {
                self.discard(id).await;
            }
            return Err(CareError::validation("token", "is required"));
        }

        match self.store.set_session_from_token(token).await {
            Ok(user) => {
                state.authenticated = true;
                state.user = Some(user);
                state.token_consumed = true;
                state.access_token = Some(token.to_string());
                info!("Session {} authenticated with token", id);
                Ok(TokenLogin {
                    session_id: id,
                    state: state.clone(),
                    already_processed: false,
                    clear_token: true,
                })
            }
            Err(e) => {
                warn!("Token login failed for session {}: {}", id, e);
                drop(state);
                if created {
                    self.discard(id).await;
                }
                Err(e)
            }
        }
    }

    /// Register an account. The session is not authenticated by this.
    pub async fn sign_up(&self, email: &str, password: &str) -> CareResult<()> {
        let email = required_text("email", email)?;
        if password.is_empty() {
            return Err(CareError::validation("password", "is required"));
        }

        self.store.sign_up(&email, password).await?;
        info!("Sign-up submitted, awaiting verification");
        Ok(())
    }

    /// End the session. Its id is unknown afterwards.
    pub async fn logout(&self, session_id: Uuid) -> CareResult<()> {
        let removed = self.sessions.write().await.remove(&session_id);
        match removed {
            Some(_) => {
                info!("Session {} logged out", session_id);
                Ok(())
            }
            None => Err(CareError::SessionNotFound(session_id.to_string())),
        }
    }

    /// Where to send the browser to log in with an OAuth provider
    pub fn authorize_url(&self, provider: &str) -> CareResult<String> {
        let provider = provider.to_ascii_lowercase();
        if !OAUTH_PROVIDERS.contains(&provider.as_str()) {
            return Err(CareError::validation(
                "provider",
                format!("unsupported provider '{}'", provider),
            ));
        }
        self.store.authorize_url(&provider, &self.oauth_redirect)
    }
}
