//! Shared fixtures: a mock Auth0 tenant and an in-memory session store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use auth0_session_transfer::OAuthConfig;
use auth0_session_transfer::middleware::{AuthUser, NewSession, SessionStore, StoreError};
use auth0_session_transfer::types::SessionId;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "test-client";
pub const AUTH_CODE: &str = "auth-code-123";
pub const ACCESS_TOKEN: &str = "access-token-abc";
pub const REFRESH_TOKEN: &str = "refresh-token-xyz";
pub const USER_ID: &str = "auth0|user-1";

pub fn oauth_config(server: &MockServer, redirect_uri: &str) -> OAuthConfig {
    OAuthConfig::new(
        CLIENT_ID,
        server.uri().parse().unwrap(),
        redirect_uri.parse().unwrap(),
    )
}

/// `POST /oauth/token` for the authorization code grant.
pub async fn mount_code_exchange(server: &MockServer, with_refresh_token: bool) {
    let mut body = json!({
        "access_token": ACCESS_TOKEN,
        "token_type": "Bearer",
        "expires_in": 86400,
        "id_token": "header.payload.signature",
        "scope": "openid profile email offline_access",
    });
    if with_refresh_token {
        body["refresh_token"] = json!(REFRESH_TOKEN);
    }

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains(format!("code={AUTH_CODE}")))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// `POST /oauth/token` for the refresh token → session transfer token exchange.
pub async fn mount_sso_exchange(server: &MockServer, session_transfer_token: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains(format!("refresh_token={REFRESH_TOKEN}")))
        .and(body_string_contains("audience=urn%3A127.0.0.1%3Asession_transfer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": session_transfer_token,
            "issued_token_type": "urn:auth0:params:oauth:token-type:session_transfer_token",
            "token_type": "N_A",
            "expires_in": 60,
        })))
        .mount(server)
        .await;
}

pub async fn mount_userinfo(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": USER_ID,
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "email_verified": true,
            "updated_at": "2024-05-01T10:00:00.000Z",
        })))
        .mount(server)
        .await;
}

pub async fn mount_user_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2/users/auth0|user-1"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": USER_ID,
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "user_metadata": { "country": "United Kingdom" },
        })))
        .mount(server)
        .await;
}

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, (AuthUser, NewSession)>>>,
}

impl InMemorySessionStore {
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn refresh_tokens(&self) -> Vec<Option<String>> {
        self.sessions
            .lock()
            .unwrap()
            .values()
            .map(|(_, s)| s.refresh_token.clone())
            .collect()
    }
}

impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: NewSession) -> Result<SessionId, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session_id = SessionId(format!("sess-{}", sessions.len() + 1));
        let user = AuthUser {
            session_id: session_id.clone(),
            user_id: session.user_id.clone(),
            name: session.user_info.name.clone(),
            email: session.user_info.email.clone(),
        };
        sessions.insert(session_id.clone(), (user, session));
        Ok(session_id)
    }

    async fn find(&self, session_id: &SessionId) -> Result<Option<AuthUser>, StoreError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(session_id)
            .map(|(user, _)| user.clone()))
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }
}
