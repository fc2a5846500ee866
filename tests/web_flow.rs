//! End-to-end web sign-in with session transfer against a mock Auth0 tenant.

mod common;

use auth0_session_transfer::middleware::{
    AuthConfig, AuthState, AuthUser, CookieKey, RelaySettings, auth_routes,
    session_transfer_relay,
};
use auth0_session_transfer::{AuthClient, SESSION_TRANSFER_TOKEN_PARAM};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use axum::{Router, middleware};
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;
use wiremock::MockServer;

use common::InMemorySessionStore;

const ORIGIN: &str = "https://localhost:3000";

fn app(server: &MockServer, store: InMemorySessionStore, configure: fn(AuthConfig) -> AuthConfig) -> Router {
    let oauth = common::oauth_config(server, &format!("{ORIGIN}/auth/callback"))
        .with_client_secret("client-secret");
    let config = configure(AuthConfig::new(AuthClient::new(oauth)).with_cookie_key(CookieKey::generate()));
    let state = AuthState::new(config, store);

    Router::new()
        .route("/Account/Profile", get(profile))
        .with_state(state.clone())
        .merge(auth_routes(state))
        .layer(middleware::from_fn_with_state(
            RelaySettings::default(),
            session_transfer_relay,
        ))
}

async fn profile(user: AuthUser) -> String {
    format!("Hello, {}", user.name.unwrap_or_default())
}

fn get_request(uri: &str, cookies: &[String]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies.join("; "));
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

/// `name=value` pairs from every `Set-Cookie` header, as a browser would send them back.
fn returned_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| !v.contains("Max-Age=0"))
        .filter_map(|v| v.split(';').next())
        .map(str::to_string)
        .collect()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_session_transfer_sign_in_round_trip() {
    let server = MockServer::start().await;
    common::mount_code_exchange(&server, true).await;
    common::mount_userinfo(&server).await;

    let store = InMemorySessionStore::default();
    let app = app(&server, store.clone(), |c| c);

    // 1. Native app opens the profile page with the token in the query string.
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("{ORIGIN}/Account/Profile?session_transfer_token=XYZ"),
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{ORIGIN}/Account/Profile"));
    let relay_cookie = returned_cookies(&response);
    assert_eq!(relay_cookie, vec!["auth0_session_transfer_token=XYZ".to_string()]);

    // 2. Without a session, the profile page sends the browser to the login route.
    let response = app
        .clone()
        .oneshot(get_request("/Account/Profile", &relay_cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let login = location(&response);
    assert_eq!(login, "/auth/login?return_to=%2FAccount%2FProfile");

    // 3. The login route forwards the relay cookie to /authorize as a query parameter.
    let response = app
        .clone()
        .oneshot(get_request(&login, &relay_cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let authorize: Url = location(&response).parse().unwrap();
    assert_eq!(authorize.path(), "/authorize");
    let param = |key: &str| {
        authorize
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    };
    assert_eq!(param(SESSION_TRANSFER_TOKEN_PARAM).as_deref(), Some("XYZ"));
    assert_eq!(param("client_id").as_deref(), Some(common::CLIENT_ID));
    let state = param("state").unwrap();
    let login_cookies = returned_cookies(&response);
    assert_eq!(login_cookies.len(), 3);

    // 4. Auth0 redirects back with a code.
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/auth/callback?code={}&state={state}", common::AUTH_CODE),
            &login_cookies,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/Account/Profile");
    let session_cookie: Vec<String> = returned_cookies(&response)
        .into_iter()
        .filter(|c| c.starts_with("__auth0_session="))
        .collect();
    assert_eq!(session_cookie.len(), 1);
    assert_eq!(store.len(), 1);
    assert_eq!(store.refresh_tokens(), vec![Some(common::REFRESH_TOKEN.to_string())]);

    // 5. Signed in.
    let response = app
        .clone()
        .oneshot(get_request("/Account/Profile", &session_cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Hello, Ada Lovelace");

    // 6. Logout removes the session.
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/logout")
                .header(header::COOKIE, session_cookie.join("; "))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_login_without_relay_cookie_has_no_transfer_param() {
    let server = MockServer::start().await;
    let app = app(&server, InMemorySessionStore::default(), |c| c);

    let response = app.oneshot(get_request("/auth/login", &[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let authorize: Url = location(&response).parse().unwrap();
    assert!(
        !authorize
            .query_pairs()
            .any(|(k, _)| k == SESSION_TRANSFER_TOKEN_PARAM)
    );
    // PKCE verifier and state only; no return path was requested.
    assert_eq!(returned_cookies(&response).len(), 2);
}

#[tokio::test]
async fn test_callback_rejects_state_mismatch() {
    let server = MockServer::start().await;
    let app = app(&server, InMemorySessionStore::default(), |c| {
        c.with_error_redirect("/error")
    });

    let response = app.clone().oneshot(get_request("/auth/login", &[])).await.unwrap();
    let login_cookies = returned_cookies(&response);

    let response = app
        .oneshot(get_request(
            "/auth/callback?code=abc&state=forged",
            &login_cookies,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/error?error=state_mismatch");
}

#[tokio::test]
async fn test_callback_reports_provider_error() {
    let server = MockServer::start().await;
    let app = app(&server, InMemorySessionStore::default(), |c| c);

    let response = app
        .oneshot(get_request(
            "/auth/callback?error=access_denied&error_description=User%20cancelled",
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/?error=access_denied");
}

#[tokio::test]
async fn test_callback_reports_token_exchange_failure() {
    let server = MockServer::start().await;
    // No token endpoint mounted: wiremock answers 404.
    let store = InMemorySessionStore::default();
    let app = app(&server, store.clone(), |c| c);

    let response = app.clone().oneshot(get_request("/auth/login", &[])).await.unwrap();
    let authorize: Url = location(&response).parse().unwrap();
    let state = authorize
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    let login_cookies = returned_cookies(&response);

    let response = app
        .oneshot(get_request(
            &format!("/auth/callback?code=abc&state={state}"),
            &login_cookies,
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/?error=token_exchange_failed");
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_unauthenticated_gets_401_when_redirects_disabled() {
    let server = MockServer::start().await;
    let app = app(&server, InMemorySessionStore::default(), |c| {
        c.with_redirect_unauthenticated(false)
    });

    let response = app.oneshot(get_request("/Account/Profile", &[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_provider_session_when_return_url_configured() {
    let server = MockServer::start().await;
    let app = app(&server, InMemorySessionStore::default(), |c| {
        c.with_logout_return_to("https://localhost:3000/".parse().unwrap())
    });

    let response = app.oneshot(get_request("/auth/logout", &[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let logout: Url = location(&response).parse().unwrap();
    assert_eq!(logout.path(), "/v2/logout");
    assert!(
        logout
            .query_pairs()
            .any(|(k, v)| k == "returnTo" && v == "https://localhost:3000/")
    );
}
