//! Native client flow: sign in, fetch profile, hand the session to the web app.

mod common;

use auth0_session_transfer::relay::{self, RelayOutcome, RequestTarget};
use auth0_session_transfer::{AuthClient, Delivery, Error, NativeSession, SESSION_TRANSFER_COOKIE, WebHandoff};
use cookie::SameSite;
use url::Url;
use wiremock::MockServer;

const PROFILE_URL: &str = "https://localhost:3000/Account/Profile";

async fn signed_in(server: &MockServer, with_refresh_token: bool) -> NativeSession {
    common::mount_code_exchange(server, with_refresh_token).await;

    let mut session = NativeSession::new(AuthClient::new(common::oauth_config(
        server,
        "com.example.app://callback",
    )));
    let request = session.begin_login();
    session
        .complete_login(common::AUTH_CODE, &request.code_verifier)
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn test_query_parameter_handoff_is_relayed_into_cookie() {
    let server = MockServer::start().await;
    common::mount_sso_exchange(&server, "stt a+b").await;
    let mut session = signed_in(&server, true).await;

    let target: Url = PROFILE_URL.parse().unwrap();
    let handoff = session
        .session_transfer(&target, Delivery::QueryParameter)
        .await
        .unwrap();

    let WebHandoff::QueryParameter { url } = handoff else {
        panic!("expected query parameter handoff");
    };

    // The web app's relay recovers the exact token and strips it from the URL.
    match relay::handle(&RequestTarget::from_url(&url)) {
        RelayOutcome::Redirect(redirect) => {
            assert_eq!(redirect.location(), PROFILE_URL);
            assert_eq!(redirect.token(), "stt a+b");
        }
        RelayOutcome::PassThrough => panic!("relay should pick up the token"),
    }
}

#[tokio::test]
async fn test_cookie_handoff() {
    let server = MockServer::start().await;
    common::mount_sso_exchange(&server, "stt-cookie").await;
    let mut session = signed_in(&server, true).await;

    let target: Url = PROFILE_URL.parse().unwrap();
    let handoff = session
        .session_transfer(&target, Delivery::Cookie)
        .await
        .unwrap();

    let WebHandoff::Cookie { url, cookie } = handoff else {
        panic!("expected cookie handoff");
    };
    assert_eq!(url, target);
    assert_eq!(cookie.name(), SESSION_TRANSFER_COOKIE);
    assert_eq!(cookie.value(), "stt-cookie");
    assert_eq!(cookie.domain(), Some("localhost"));
    assert_eq!(cookie.same_site(), Some(SameSite::None));
    assert_eq!(cookie.max_age(), Some(time::Duration::seconds(60)));
}

#[tokio::test]
async fn test_session_transfer_requires_refresh_token() {
    let server = MockServer::start().await;
    let mut session = signed_in(&server, false).await;

    let err = session
        .session_transfer(&PROFILE_URL.parse().unwrap(), Delivery::QueryParameter)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingRefreshToken));
}

#[tokio::test]
async fn test_failed_exchange_surfaces_authentication_error() {
    let server = MockServer::start().await;
    // Only the code grant is mocked; the refresh grant gets a 404.
    let mut session = signed_in(&server, true).await;

    let err = session
        .session_transfer(&PROFILE_URL.parse().unwrap(), Delivery::Cookie)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Authentication { status: Some(404), .. }));
    assert!(session.is_signed_in());
}

#[tokio::test]
async fn test_profile_and_metadata() {
    let server = MockServer::start().await;
    common::mount_userinfo(&server).await;
    common::mount_user_profile(&server).await;
    let mut session = signed_in(&server, true).await;

    // Metadata lookup loads the profile first.
    let profile = session.fetch_user_metadata().await.unwrap();
    assert_eq!(profile.metadata_str("country"), Some("United Kingdom"));
    assert_eq!(
        session.profile().and_then(|p| p.name.as_deref()),
        Some("Ada Lovelace")
    );
}

#[tokio::test]
async fn test_sign_out_clears_state() {
    let server = MockServer::start().await;
    let mut session = signed_in(&server, true).await;
    assert!(session.is_signed_in());

    let logout = session.logout_url(Some(&"com.example.app://logout".parse().unwrap()));
    assert_eq!(logout.path(), "/v2/logout");

    session.sign_out();
    assert!(!session.is_signed_in());
    assert!(session.credentials().is_none());
    assert!(matches!(
        session.load_profile().await,
        Err(Error::NotSignedIn)
    ));
}
