//! Web app that accepts a session handed over by a native client.
//!
//! ```sh
//! AUTH0_DOMAIN=tenant.eu.auth0.com \
//! AUTH0_CLIENT_ID=... \
//! AUTH0_REDIRECT_URI=https://localhost:3000/auth/callback \
//! cargo run --example web
//! ```
//!
//! A native app opens `https://localhost:3000/Account/Profile?session_transfer_token=...`;
//! the relay moves the token into a cookie and the sign-in completes without a prompt.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use auth0_session_transfer::generate_state;
use auth0_session_transfer::middleware::{
    AuthConfig, AuthState, AuthUser, NewSession, RelaySettings, SessionStore, StoreError,
    auth_routes, session_transfer_relay,
};
use auth0_session_transfer::types::SessionId;
use axum::Router;
use axum::routing::get;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Default)]
struct MemoryStore {
    sessions: Arc<Mutex<HashMap<SessionId, AuthUser>>>,
}

impl SessionStore for MemoryStore {
    async fn create(&self, session: NewSession) -> Result<SessionId, StoreError> {
        let session_id = SessionId(generate_state());
        let user = AuthUser {
            session_id: session_id.clone(),
            user_id: session.user_id,
            name: session.user_info.name,
            email: session.user_info.email,
        };
        self.sessions
            .lock()
            .map_err(|e| e.to_string())?
            .insert(session_id.clone(), user);
        Ok(session_id)
    }

    async fn find(&self, session_id: &SessionId) -> Result<Option<AuthUser>, StoreError> {
        let sessions = self.sessions.lock().map_err(|e| e.to_string())?;
        Ok(sessions.get(session_id).cloned())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .map_err(|e| e.to_string())?
            .remove(session_id);
        Ok(())
    }
}

async fn home(user: Option<AuthUser>) -> String {
    match user {
        Some(user) => format!("Signed in as {}", user.user_id),
        None => "Not signed in. Visit /auth/login".to_string(),
    }
}

async fn profile(user: AuthUser) -> String {
    format!(
        "Hello, {} <{}>",
        user.name.as_deref().unwrap_or("user"),
        user.email.as_deref().unwrap_or("no email")
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,auth0_session_transfer=debug")),
        )
        .init();

    let state = AuthState::new(AuthConfig::from_env()?, MemoryStore::default());

    let app = Router::new()
        .route("/", get(home))
        .route("/Account/Profile", get(profile))
        .with_state(state.clone())
        .merge(auth_routes(state))
        .layer(axum::middleware::from_fn_with_state(
            RelaySettings::from_env(),
            session_transfer_relay,
        ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, app).await?;
    Ok(())
}
