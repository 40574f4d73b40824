use std::sync::Arc;

use crate::engine::runtime::SessionManager;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
}

impl FromRef<AppState> for Arc<SessionManager> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
