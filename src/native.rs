//! Native client side of the session transfer handoff.
//!
//! A [`NativeSession`] owns everything a native app caches after signing in:
//! the credentials and the last fetched profile. It exchanges its refresh
//! token for a session transfer token and prepares a [`WebHandoff`] that opens
//! the web app already signed in.
//!
//! ```rust,ignore
//! let mut session = NativeSession::new(AuthClient::new(config));
//!
//! let request = session.begin_login();
//! // ... open request.url, receive `code` on the custom-scheme callback ...
//! session.complete_login(&code, &request.code_verifier).await?;
//!
//! let target = "https://localhost:3000/Account/Profile".parse()?;
//! match session.session_transfer(&target, Delivery::Cookie).await? {
//!     WebHandoff::Cookie { url, cookie } => { /* set cookie in web view store, load url */ }
//!     WebHandoff::QueryParameter { url } => { /* open url in browser */ }
//! }
//! ```

use cookie::{Cookie, SameSite};
use url::Url;

use crate::error::Error;
use crate::oauth::{AuthClient, AuthorizationRequest, TokenResponse, UserInfo, UserProfile};
use crate::relay::{SESSION_TRANSFER_COOKIE, SESSION_TRANSFER_TOKEN_PARAM};

/// How the session transfer token reaches the web app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Append `session_transfer_token` to the URL. For browser components that
    /// cannot set cookies; the web app's relay turns it into a cookie.
    QueryParameter,
    /// Hand back a cookie for a browser component sharing a writable cookie store.
    Cookie,
}

/// What the native app opens to continue in the browser.
#[derive(Debug, Clone, PartialEq)]
pub enum WebHandoff {
    QueryParameter { url: Url },
    Cookie { url: Url, cookie: Cookie<'static> },
}

impl WebHandoff {
    #[must_use]
    pub fn url(&self) -> &Url {
        match self {
            Self::QueryParameter { url } | Self::Cookie { url, .. } => url,
        }
    }
}

#[derive(Debug)]
enum NativeState {
    SignedOut,
    SignedIn {
        credentials: TokenResponse,
        profile: Option<UserInfo>,
    },
}

/// Explicit client state for one signed-in user.
pub struct NativeSession {
    client: AuthClient,
    state: NativeState,
}

impl NativeSession {
    #[must_use]
    pub fn new(client: AuthClient) -> Self {
        Self {
            client,
            state: NativeState::SignedOut,
        }
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        matches!(self.state, NativeState::SignedIn { .. })
    }

    #[must_use]
    pub fn credentials(&self) -> Option<&TokenResponse> {
        match &self.state {
            NativeState::SignedIn { credentials, .. } => Some(credentials),
            NativeState::SignedOut => None,
        }
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserInfo> {
        match &self.state {
            NativeState::SignedIn { profile, .. } => profile.as_ref(),
            NativeState::SignedOut => None,
        }
    }

    /// Start the interactive login. Keep `code_verifier` until the callback.
    #[must_use]
    pub fn begin_login(&self) -> AuthorizationRequest {
        self.client.authorization_url(None)
    }

    /// Finish the login with the code delivered to the callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] or [`Error::Http`] if the code exchange fails.
    /// The session stays signed out in that case.
    pub async fn complete_login(
        &mut self,
        code: &str,
        code_verifier: &str,
    ) -> Result<&TokenResponse, Error> {
        let credentials = self.client.exchange_code(code, code_verifier).await?;
        if credentials.refresh_token.is_none() {
            tracing::warn!("Signed in without a refresh token; session transfer unavailable");
        }
        self.state = NativeState::SignedIn {
            credentials,
            profile: None,
        };
        self.credentials().ok_or(Error::NotSignedIn)
    }

    /// Fetch and cache the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] when signed out, or the userinfo failure.
    pub async fn load_profile(&mut self) -> Result<&UserInfo, Error> {
        let NativeState::SignedIn {
            credentials,
            profile,
        } = &mut self.state
        else {
            return Err(Error::NotSignedIn);
        };

        let info = self.client.get_user_info(&credentials.access_token).await?;
        Ok(profile.insert(info))
    }

    /// Fetch the full Management API record (with `user_metadata`) for the signed-in user.
    ///
    /// Loads the profile first if it has not been fetched yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] when signed out, [`Error::Management`]
    /// if the Management API call fails.
    pub async fn fetch_user_metadata(&mut self) -> Result<UserProfile, Error> {
        if self.profile().is_none() {
            self.load_profile().await?;
        }
        let NativeState::SignedIn {
            credentials,
            profile: Some(profile),
        } = &self.state
        else {
            return Err(Error::NotSignedIn);
        };

        self.client
            .get_user_profile(&credentials.access_token, &profile.sub)
            .await
    }

    /// URL that clears the identity provider's browser session.
    #[must_use]
    pub fn logout_url(&self, return_to: Option<&Url>) -> Url {
        self.client.logout_url(return_to)
    }

    /// Drop cached credentials and profile.
    pub fn sign_out(&mut self) {
        self.state = NativeState::SignedOut;
    }

    /// Exchange the refresh token for a session transfer token and prepare the
    /// browser handoff to `target`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotSignedIn`] when signed out
    /// - [`Error::MissingRefreshToken`] when the login did not request `offline_access`
    /// - [`Error::Authentication`] / [`Error::Http`] if the exchange fails
    pub async fn session_transfer(
        &mut self,
        target: &Url,
        delivery: Delivery,
    ) -> Result<WebHandoff, Error> {
        let NativeState::SignedIn { credentials, .. } = &mut self.state else {
            return Err(Error::NotSignedIn);
        };
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or(Error::MissingRefreshToken)?;

        let sso = self.client.sso_exchange(refresh_token).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to get session transfer token");
        })?;

        // Refresh token rotation hands back a new refresh token.
        if let Some(rotated) = sso.refresh_token.clone() {
            credentials.refresh_token = Some(rotated);
        }

        let token = sso.session_transfer_token.as_str();
        let handoff = match delivery {
            Delivery::QueryParameter => WebHandoff::QueryParameter {
                url: with_transfer_param(target, token),
            },
            Delivery::Cookie => WebHandoff::Cookie {
                url: target.clone(),
                cookie: handoff_cookie(target, token, sso.expires_in),
            },
        };

        tracing::debug!(url = %handoff.url(), ?delivery, "Session transfer prepared");
        Ok(handoff)
    }
}

fn with_transfer_param(target: &Url, token: &str) -> Url {
    let retained: Vec<(String, String)> = target
        .query_pairs()
        .filter(|(k, _)| k != SESSION_TRANSFER_TOKEN_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = target.clone();
    url.set_query(None);
    url.query_pairs_mut()
        .extend_pairs(retained)
        .append_pair(SESSION_TRANSFER_TOKEN_PARAM, token);
    url
}

fn handoff_cookie(target: &Url, token: &str, expires_in: Option<u64>) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_TRANSFER_COOKIE, token.to_owned()))
        .path("/")
        .secure(true)
        .http_only(true)
        .same_site(SameSite::None);

    if let Some(host) = target.host_str() {
        builder = builder.domain(host.to_owned());
    }
    if let Some(secs) = expires_in {
        builder = builder.max_age(time::Duration::seconds(
            i64::try_from(secs).unwrap_or(i64::MAX),
        ));
    }
    builder.build()
}
