//! Extractors that carry the client session into handlers.

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::domain::SessionState;
use crate::error::CareError;
use crate::AppState;

/// Header holding the client's session id
pub const SESSION_HEADER: &str = "x-session-id";

/// Session id sent by the client, if any. A malformed id counts as absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionHeader(pub Option<Uuid>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionHeader {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session_id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok());
        Ok(SessionHeader(session_id))
    }
}

/// An authenticated session. Handlers taking this extractor are never
/// reached by anonymous callers.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub session_id: Uuid,
    pub state: SessionState,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedSession {
    type Rejection = CareError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let SessionHeader(session_id) = match SessionHeader::from_request_parts(parts, state).await {
            Ok(header) => header,
            Err(never) => match never {},
        };

        let session = state.session_service.require_authenticated(session_id).await?;
        Ok(AuthenticatedSession {
            session_id: session_id.ok_or(CareError::NotAuthenticated)?,
            state: session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::MemoryStore;
    use axum::http::Request;
    use std::sync::Arc;

    fn parts_with(session: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/caregivers");
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_authenticated_session_carries_caller_id() {
        let store = Arc::new(MemoryStore::new());
        store.add_user("ana@example.com", "secret");
        let state = AppState::new(store, Config::memory());
        let (id, _) = state
            .session_service
            .login_with_password(None, "ana@example.com", "secret")
            .await
            .unwrap();

        let mut parts = parts_with(Some(&id.to_string()));
        let session = AuthenticatedSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(session.session_id, id);
        assert!(session.state.is_authenticated());
    }

    #[tokio::test]
    async fn test_malformed_or_missing_header_is_rejected() {
        let state = AppState::new(Arc::new(MemoryStore::new()), Config::memory());

        for header in [None, Some("not-a-uuid")] {
            let mut parts = parts_with(header);
            let SessionHeader(id) = match SessionHeader::from_request_parts(&mut parts, &state).await {
                Ok(header) => header,
                Err(never) => match never {},
            };
            assert_eq!(id, None);
            let result = AuthenticatedSession::from_request_parts(&mut parts, &state).await;
            assert_eq!(result.unwrap_err(), CareError::NotAuthenticated);
        }
    }
}
