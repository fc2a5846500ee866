use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, header::USER_AGENT};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum_extra::extract::{CookieJar, PrivateCookieJar};
use serde::Deserialize;

use super::cookies;
use super::state::AuthState;
use super::types::NewSession;
use crate::types::SessionId;

/// Create the Auth0 sign-in router (`login`, `callback`, `logout` under the auth path).
pub fn auth_routes<S>(state: AuthState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let auth_path = state.settings.auth_path.clone();

    Router::new()
        .route(&format!("{auth_path}/login"), get(login))
        .route(&format!("{auth_path}/callback"), get(callback))
        .route(&format!("{auth_path}/logout"), get(logout).post(logout))
        .with_state(state)
}

// ── Login ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginParams {
    return_to: Option<String>,
}

async fn login(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    plain_jar: CookieJar,
    Query(params): Query<LoginParams>,
) -> (PrivateCookieJar, Redirect) {
    // `/authorize` ignores the relay cookie, so it travels as a query parameter.
    let transfer_token = cookies::get_session_transfer_token(&plain_jar);
    if transfer_token.is_some() {
        tracing::debug!("session_transfer_token included in authorize request");
    }

    let auth_req = state.client.authorization_url(transfer_token.as_deref());
    let return_to = params.return_to.as_deref().and_then(local_path);

    let jar = cookies::login_cookies(
        &auth_req.code_verifier,
        &auth_req.state,
        return_to,
        state.settings.secure_cookies,
        &state.settings.auth_path,
    )
    .into_iter()
    .fold(jar, |jar, cookie| jar.add(cookie));

    (jar, Redirect::to(&auth_req.url))
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn callback(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    if let Some(error) = &params.error {
        let desc = params.error_description.as_deref().unwrap_or("Unknown error");
        tracing::warn!(error = %error, description = %desc, "OAuth2 error from Auth0");
        return Err(login_error(&state.settings.error_redirect, error));
    }

    let code = params
        .code
        .ok_or_else(|| login_error(&state.settings.error_redirect, "missing_code"))?;

    let received_state = params
        .state
        .ok_or_else(|| login_error(&state.settings.error_redirect, "state_mismatch"))?;

    let stored_state = cookies::get_state(&jar)
        .ok_or_else(|| login_error(&state.settings.error_redirect, "state_mismatch"))?;

    if received_state != stored_state {
        tracing::warn!("OAuth state mismatch");
        return Err(login_error(&state.settings.error_redirect, "state_mismatch"));
    }

    let code_verifier = cookies::get_pkce_verifier(&jar)
        .ok_or_else(|| login_error(&state.settings.error_redirect, "missing_verifier"))?;

    let token_response = state
        .client
        .exchange_code(&code, &code_verifier)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Token exchange failed");
            login_error(&state.settings.error_redirect, "token_exchange_failed")
        })?;

    let user_info = state
        .client
        .get_user_info(&token_response.access_token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Userinfo request failed");
            login_error(&state.settings.error_redirect, "userinfo_failed")
        })?;

    let session = NewSession {
        user_id: user_info.sub.clone(),
        refresh_token: token_response.refresh_token,
        user_agent: extract_user_agent(&headers),
        ip_address: extract_client_ip(&headers),
        user_info,
    };

    let session_id = state
        .session_store
        .create_dyn(session)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Session creation failed");
            login_error(&state.settings.error_redirect, "session_failed")
        })?;

    let session_cookie = cookies::session_cookie(
        &state.settings.session_cookie_name,
        &session_id.to_string(),
        state.settings.session_ttl_days,
        state.settings.secure_cookies,
    );

    let destination = cookies::get_return_to(&jar)
        .as_deref()
        .and_then(local_path)
        .unwrap_or(&state.settings.login_redirect)
        .to_string();

    let jar = cookies::clear_login_cookies(&state.settings.auth_path)
        .into_iter()
        .fold(jar.add(session_cookie), |jar, cookie| jar.add(cookie));

    tracing::info!(session_id = %session_id, "Auth0 login successful");

    Ok((jar, Redirect::to(&destination)))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    if let Some(cookie) = jar.get(&state.settings.session_cookie_name) {
        let session_id = SessionId(cookie.value().to_string());
        if let Err(e) = state.session_store.delete_dyn(&session_id).await {
            tracing::warn!(error = %e, "Session deletion failed during logout");
        }
    }

    let destination = match &state.settings.logout_return_to {
        Some(return_to) => state.client.logout_url(Some(return_to)).to_string(),
        None => state.settings.logout_redirect.clone(),
    };

    let clear_cookie = cookies::clear_session_cookie(&state.settings.session_cookie_name);
    (jar.remove(clear_cookie), Redirect::to(&destination))
}

// ── Helpers ────────────────────────────────────────────────────────

fn login_error(error_redirect: &str, code: &str) -> Response {
    let encoded = urlencoding::encode(code);
    Redirect::to(&format!("{error_redirect}?error={encoded}")).into_response()
}

/// Accept only same-origin absolute paths (`/x`), never `//host` or `/\host`.
fn local_path(path: &str) -> Option<&str> {
    let is_local = path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(char::is_control);
    is_local.then_some(path)
}

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}
