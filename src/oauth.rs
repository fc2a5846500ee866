use serde::Deserialize;
use url::Url;

use crate::error::Error;
use crate::pkce;
use crate::relay::SESSION_TRANSFER_TOKEN_PARAM;
use crate::types::{SessionTransferToken, UserId};

/// Auth0 application configuration.
///
/// Required fields are constructor parameters; endpoints are derived from the
/// tenant issuer and can be overridden individually.
///
/// ```rust,ignore
/// use auth0_session_transfer::OAuthConfig;
///
/// let config = OAuthConfig::for_domain("my-client-id", "tenant.eu.auth0.com", "https://my-app.com/callback".parse()?)?
///     .with_client_secret("...")
///     .with_audience("https://api.my-app.com");
/// ```
#[derive(Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: Option<String>,
    pub(crate) issuer: Url,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) userinfo_url: Url,
    pub(crate) logout_url: Url,
    pub(crate) management_url: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) scopes: Vec<String>,
    pub(crate) audience: Option<String>,
}

impl OAuthConfig {
    /// Create a configuration for the tenant at `issuer` (e.g. `https://tenant.auth0.com/`).
    #[must_use]
    pub fn new(client_id: impl Into<String>, issuer: Url, redirect_uri: Url) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            auth_url: endpoint(&issuer, "/authorize"),
            token_url: endpoint(&issuer, "/oauth/token"),
            userinfo_url: endpoint(&issuer, "/userinfo"),
            logout_url: endpoint(&issuer, "/v2/logout"),
            management_url: endpoint(&issuer, "/api/v2/"),
            issuer,
            redirect_uri,
            // offline_access yields the refresh token needed for session transfer
            scopes: vec![
                "openid".into(),
                "profile".into(),
                "email".into(),
                "offline_access".into(),
            ],
            audience: None,
        }
    }

    /// Create a configuration from a bare tenant domain such as `tenant.auth0.com`.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `https://{domain}/` is not a valid URL.
    pub fn for_domain(
        client_id: impl Into<String>,
        domain: &str,
        redirect_uri: Url,
    ) -> Result<Self, url::ParseError> {
        let issuer = Url::parse(&format!("https://{}/", domain.trim_end_matches('/')))?;
        Ok(Self::new(client_id, issuer, redirect_uri))
    }

    /// Client secret for confidential (web) applications.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// API audience requested on the authorization request.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Override the OAuth2 scopes (default: `openid profile email offline_access`).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn with_userinfo_url(mut self, url: Url) -> Self {
        self.userinfo_url = url;
        self
    }

    #[must_use]
    pub fn with_logout_url(mut self, url: Url) -> Self {
        self.logout_url = url;
        self
    }

    /// Override the Management API base (must end with `/`).
    #[must_use]
    pub fn with_management_url(mut self, url: Url) -> Self {
        self.management_url = url;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn issuer(&self) -> &Url {
        &self.issuer
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    #[must_use]
    pub fn userinfo_url(&self) -> &Url {
        &self.userinfo_url
    }

    #[must_use]
    pub fn logout_url(&self) -> &Url {
        &self.logout_url
    }

    #[must_use]
    pub fn management_url(&self) -> &Url {
        &self.management_url
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    /// Audience used for the refresh token → session transfer token exchange.
    #[must_use]
    pub fn session_transfer_audience(&self) -> String {
        format!(
            "urn:{}:session_transfer",
            self.issuer.host_str().unwrap_or_default()
        )
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("issuer", &self.issuer.as_str())
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("scopes", &self.scopes)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

fn endpoint(issuer: &Url, path: &str) -> Url {
    let mut url = issuer.clone();
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// `OAuth2` client for the Auth0 Authentication and Management APIs.
pub struct AuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

/// Authorization URL with PKCE parameters to store until the callback.
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub code_verifier: String,
}

/// Token response from the `/oauth/token` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Result of exchanging a refresh token for a session transfer token.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct SsoCredentials {
    #[serde(rename = "access_token")]
    pub session_transfer_token: SessionTransferToken,
    #[serde(default)]
    pub issued_token_type: Option<String>,
    /// Lifetime of the session transfer token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub id_token: Option<String>,
    /// Present when refresh token rotation is enabled.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// OIDC claims from the `/userinfo` endpoint.
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserInfo {
    pub sub: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<time::OffsetDateTime>,
}

impl UserInfo {
    /// Create a new `UserInfo` with only the required `sub` field.
    #[must_use]
    pub fn new(sub: UserId) -> Self {
        Self {
            sub,
            name: None,
            nickname: None,
            email: None,
            email_verified: None,
            picture: None,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Full user record from the Management API (`GET /api/v2/users/{id}`).
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct UserProfile {
    pub user_id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// String-valued `user_metadata` entry (e.g. `"country"`).
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Clone, Copy)]
enum Api {
    Authentication,
    Management,
}

impl AuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Generate an authorization URL with PKCE parameters.
    ///
    /// A session transfer token, when given, is forwarded as the
    /// `session_transfer_token` query parameter: `/authorize` does not pick up
    /// the relay cookie on its own.
    #[must_use]
    pub fn authorization_url(&self, session_transfer_token: Option<&str>) -> AuthorizationRequest {
        let state = pkce::generate_state();
        let code_verifier = pkce::generate_code_verifier();
        let code_challenge = pkce::generate_code_challenge(&code_verifier);
        let scope = self.config.scopes.join(" ");

        let mut url = self.config.auth_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", self.config.redirect_uri.as_str())
                .append_pair("scope", &scope)
                .append_pair("state", &state)
                .append_pair("code_challenge", &code_challenge)
                .append_pair("code_challenge_method", "S256");

            if let Some(audience) = &self.config.audience {
                query.append_pair("audience", audience);
            }
            if let Some(token) = session_transfer_token.filter(|t| !t.is_empty()) {
                query.append_pair(SESSION_TRANSFER_TOKEN_PARAM, token);
            }
        }

        AuthorizationRequest {
            url: url.into(),
            state,
            code_verifier,
        }
    }

    /// Build the `/v2/logout` URL that ends the identity provider session.
    #[must_use]
    pub fn logout_url(&self, return_to: Option<&Url>) -> Url {
        let mut url = self.config.logout_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id);
        if let Some(return_to) = return_to {
            url.query_pairs_mut()
                .append_pair("returnTo", return_to.as_str());
        }
        url
    }

    /// Exchange an authorization code for tokens using PKCE.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::Authentication`] if the token endpoint rejects the code.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, Error> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];
        if let Some(secret) = &self.config.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let response = Self::ensure_success(response, "token exchange", Api::Authentication).await?;
        response.json::<TokenResponse>().await.map_err(Into::into)
    }

    /// Exchange a refresh token for a short-lived session transfer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::Authentication`] if the exchange is rejected.
    pub async fn sso_exchange(&self, refresh_token: &str) -> Result<SsoCredentials, Error> {
        let audience = self.config.session_transfer_audience();
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("audience", audience.as_str()),
        ];
        if let Some(secret) = &self.config.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let response =
            Self::ensure_success(response, "session transfer exchange", Api::Authentication).await?;
        response.json::<SsoCredentials>().await.map_err(Into::into)
    }

    /// Fetch OIDC user info using an access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::Authentication`] if the userinfo endpoint returns an error.
    pub async fn get_user_info(&self, access_token: &str) -> Result<UserInfo, Error> {
        let response = self
            .http
            .get(self.config.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::ensure_success(response, "userinfo request", Api::Authentication).await?;
        response.json::<UserInfo>().await.map_err(Into::into)
    }

    /// Fetch the full user record, including `user_metadata`, from the Management API.
    ///
    /// The access token needs the `read:current_user` scope for the Management API audience.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::Management`] if the Management API returns an error.
    pub async fn get_user_profile(
        &self,
        access_token: &str,
        user_id: &UserId,
    ) -> Result<UserProfile, Error> {
        let mut url = self.config.management_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Management {
                operation: "user profile request",
                status: None,
                detail: format!("invalid Management API base URL: {}", self.config.management_url),
            })?
            .pop_if_empty()
            .push("users")
            .push(user_id.as_str());

        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::ensure_success(response, "user profile request", Api::Management).await?;
        response.json::<UserProfile>().await.map_err(Into::into)
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
        api: Api,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = Some(response.status().as_u16());
        let detail = response.text().await.unwrap_or_default();
        Err(match api {
            Api::Authentication => Error::Authentication {
                operation,
                status,
                detail,
            },
            Api::Management => Error::Management {
                operation,
                status,
                detail,
            },
        })
    }
}
