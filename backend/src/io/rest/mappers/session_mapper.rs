use shared::{SessionResponse, TokenLoginResponse};
use uuid::Uuid;

use crate::domain::{SessionState, TokenLogin};

/// Converts domain session state into the DTOs sent to clients. The access
/// token never leaves the server.
pub struct SessionMapper;

impl SessionMapper {
    pub fn to_dto(session_id: Uuid, state: &SessionState) -> SessionResponse {
        SessionResponse {
            session_id: session_id.to_string(),
            authenticated: state.is_authenticated(),
            user: state.current_user().cloned(),
            token_consumed: state.token_consumed,
        }
    }

    pub fn to_token_login_dto(login: TokenLogin) -> TokenLoginResponse {
        TokenLoginResponse {
            session: Self::to_dto(login.session_id, &login.state),
            already_processed: login.already_processed,
            clear_token: login.clear_token,
        }
    }
}
