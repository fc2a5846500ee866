use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::{AuthConfig, AuthSettings};
use super::traits::{SessionStore, SessionStoreDyn};
use crate::oauth::AuthClient;

/// Shared state for the auth routes and the [`AuthUser`](super::AuthUser) extractor.
///
/// Cheap to clone. Embed it in your own state and implement
/// `FromRef<YourState> for AuthState` to use `AuthUser` in your handlers.
#[derive(Clone)]
pub struct AuthState {
    pub(super) client: Arc<AuthClient>,
    pub(super) session_store: Arc<dyn SessionStoreDyn>,
    pub(super) settings: AuthSettings,
}

impl AuthState {
    #[must_use]
    pub fn new<S: SessionStore>(config: AuthConfig, session_store: S) -> Self {
        Self {
            client: Arc::new(config.client),
            session_store: Arc::new(session_store),
            settings: config.settings,
        }
    }

    pub(super) fn login_path(&self) -> String {
        format!("{}/login", self.settings.auth_path)
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.settings.cookie_key.clone()
    }
}
