use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::{CookieJar, PrivateCookieJar};
use time::Duration;

use crate::relay::SESSION_TRANSFER_COOKIE;

const PKCE_COOKIE_NAME: &str = "__auth0_pkce";
const STATE_COOKIE_NAME: &str = "__auth0_state";
const RETURN_TO_COOKIE_NAME: &str = "__auth0_return_to";

fn login_cookie(name: &'static str, value: &str, secure: bool, auth_path: &str) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(auth_path.to_string())
        .max_age(Duration::minutes(5))
        .build()
}

fn removal_cookie(name: &'static str, path: &str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path(path.to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Create PKCE verifier, state, and (optional) return path cookies for the authorization request.
pub(super) fn login_cookies(
    code_verifier: &str,
    state: &str,
    return_to: Option<&str>,
    secure: bool,
    auth_path: &str,
) -> Vec<Cookie<'static>> {
    let mut cookies = vec![
        login_cookie(PKCE_COOKIE_NAME, code_verifier, secure, auth_path),
        login_cookie(STATE_COOKIE_NAME, state, secure, auth_path),
    ];
    if let Some(path) = return_to {
        cookies.push(login_cookie(RETURN_TO_COOKIE_NAME, path, secure, auth_path));
    }
    cookies
}

/// Create removal cookies for everything [`login_cookies`] sets.
pub(super) fn clear_login_cookies(auth_path: &str) -> [Cookie<'static>; 3] {
    [
        removal_cookie(PKCE_COOKIE_NAME, auth_path),
        removal_cookie(STATE_COOKIE_NAME, auth_path),
        removal_cookie(RETURN_TO_COOKIE_NAME, auth_path),
    ]
}

/// Create session cookie.
pub(super) fn session_cookie(
    name: &str,
    session_id: &str,
    ttl_days: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name.to_string(), session_id.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::days(ttl_days))
        .build()
}

/// Create removal cookie for session.
pub(super) fn clear_session_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

pub(super) fn get_pkce_verifier(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(PKCE_COOKIE_NAME).map(|c| c.value().to_string())
}

pub(super) fn get_state(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(STATE_COOKIE_NAME).map(|c| c.value().to_string())
}

pub(super) fn get_return_to(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(RETURN_TO_COOKIE_NAME).map(|c| c.value().to_string())
}

/// Get the relay cookie. It is set in plain text by the relay or by a native app.
pub(super) fn get_session_transfer_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_TRANSFER_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
