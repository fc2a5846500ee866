use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::PrivateCookieJar;

use super::error::AuthError;
use super::state::AuthState;
use crate::types::{SessionId, UserId};

/// Authenticated user extracted from session cookie.
///
/// Use as an Axum extractor in route handlers. Without a valid session the
/// browser is redirected to the login route (or gets `401 Unauthorized` when
/// redirects are disabled); the login route comes back to the original path.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}", user.name.as_deref().unwrap_or("user"))
/// }
///
/// // Optional: accessible to both authenticated and anonymous users
/// async fn public(user: Option<AuthUser>) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}", u.user_id),
///         None => "Hello, guest".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Session ID (from cookie).
    pub session_id: SessionId,
    /// Auth0 user identifier (OIDC `sub` claim).
    pub user_id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AuthState::from_ref(state);
        let jar: PrivateCookieJar =
            PrivateCookieJar::from_headers(&parts.headers, state.settings.cookie_key.clone());

        let Some(session_id) = jar
            .get(&state.settings.session_cookie_name)
            .map(|c| SessionId(c.value().to_string()))
        else {
            return Err(challenge(&state, parts, AuthError::Unauthenticated));
        };

        match state.session_store.find_dyn(&session_id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(challenge(&state, parts, AuthError::SessionExpired)),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <Self as FromRequestParts<S>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(AuthError::Store(e)) => Err(AuthError::Store(e)),
            Err(_) => Ok(None),
        }
    }
}

fn challenge(state: &AuthState, parts: &Parts, error: AuthError) -> AuthError {
    if !state.settings.redirect_unauthenticated {
        return error;
    }
    let return_to = parts
        .uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    AuthError::LoginRequired {
        login_url: format!(
            "{}?return_to={}",
            state.login_path(),
            urlencoding::encode(return_to)
        ),
    }
}
