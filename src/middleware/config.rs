use axum_extra::extract::cookie::Key;
use url::Url;

use super::error::AuthError;
use crate::oauth::{AuthClient, OAuthConfig};

/// Shared auth settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct AuthSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl_days: i64,
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
    pub(crate) login_redirect: String,
    pub(crate) logout_redirect: String,
    pub(crate) logout_return_to: Option<Url>,
    pub(crate) error_redirect: String,
    pub(crate) redirect_unauthenticated: bool,
}

impl AuthSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "__auth0_session".into(),
            session_ttl_days: 7,
            secure_cookies: true,
            auth_path: "/auth".into(),
            login_redirect: "/".into(),
            logout_redirect: "/".into(),
            logout_return_to: None,
            error_redirect: "/".into(),
            redirect_unauthenticated: true,
        }
    }
}

/// Auth0 web sign-in configuration.
///
/// The required `client` is a constructor parameter, so there are no runtime "missing field" errors.
///
/// Use [`from_env()`](AuthConfig::from_env) for convention-based setup,
/// or [`new()`](AuthConfig::new) with `with_*` methods for full control.
pub struct AuthConfig {
    pub(super) client: AuthClient,
    pub(super) settings: AuthSettings,
}

impl AuthConfig {
    /// Create config with the required `AuthClient`.
    ///
    /// All optional fields use sensible defaults. Override with `with_*` methods.
    #[must_use]
    pub fn new(client: AuthClient) -> Self {
        Self {
            client,
            settings: AuthSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `AUTH0_DOMAIN`: Tenant domain, e.g. `tenant.eu.auth0.com`
    /// - `AUTH0_CLIENT_ID`: Application client ID
    /// - `AUTH0_REDIRECT_URI`: Callback URI (must be a valid URL)
    ///
    /// # Optional env vars
    /// - `AUTH0_CLIENT_SECRET`: Client secret for the code exchange
    /// - `AUTH0_AUDIENCE`: API audience for the authorization request
    /// - `AUTH0_SCOPES`: Comma-separated OAuth2 scopes
    /// - `AUTH0_LOGOUT_RETURN_TO`: Absolute URL Auth0 returns to after logout
    /// - `INSECURE_COOKIES`: Set to `"1"` or `"true"` to drop `Secure` on sign-in cookies (local HTTP only)
    /// - `COOKIE_KEY`: Cookie encryption key bytes
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if required env vars are missing or URLs are invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        let domain = required_env("AUTH0_DOMAIN")?;
        let client_id = required_env("AUTH0_CLIENT_ID")?;
        let redirect_uri = parse_url_env("AUTH0_REDIRECT_URI", &required_env("AUTH0_REDIRECT_URI")?)?;

        let mut config = OAuthConfig::for_domain(client_id, &domain, redirect_uri)
            .map_err(|e| AuthError::Config(format!("AUTH0_DOMAIN: {e}")))?;

        if let Ok(secret) = std::env::var("AUTH0_CLIENT_SECRET") {
            config = config.with_client_secret(secret);
        }
        if let Ok(audience) = std::env::var("AUTH0_AUDIENCE") {
            config = config.with_audience(audience);
        }
        if let Ok(scopes) = std::env::var("AUTH0_SCOPES") {
            config =
                config.with_scopes(scopes.split(',').map(|s| s.trim().to_string()).collect());
        }

        let insecure = matches!(
            std::env::var("INSECURE_COOKIES").as_deref(),
            Ok("1") | Ok("true"),
        );

        let cookie_key = match std::env::var("COOKIE_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                AuthError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            Err(_) => Key::generate(),
        };

        let mut auth = Self::new(AuthClient::new(config))
            .with_cookie_key(cookie_key)
            .with_secure_cookies(!insecure);

        if let Ok(url_str) = std::env::var("AUTH0_LOGOUT_RETURN_TO") {
            auth = auth.with_logout_return_to(parse_url_env("AUTH0_LOGOUT_RETURN_TO", &url_str)?);
        }

        Ok(auth)
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl_days(mut self, days: i64) -> Self {
        self.settings.session_ttl_days = days;
        self
    }

    /// `Secure` flag for the PKCE and session cookies. The relay cookie is always `Secure`.
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_path = path.into();
        self
    }

    #[must_use]
    pub fn with_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.login_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.logout_redirect = path.into();
        self
    }

    /// End the Auth0 session on logout and come back to `url`.
    #[must_use]
    pub fn with_logout_return_to(mut self, url: Url) -> Self {
        self.settings.logout_return_to = Some(url);
        self
    }

    #[must_use]
    pub fn with_error_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.error_redirect = path.into();
        self
    }

    /// Redirect unauthenticated [`AuthUser`](super::AuthUser) extractions to the
    /// login route (default) instead of answering `401`.
    #[must_use]
    pub fn with_redirect_unauthenticated(mut self, redirect: bool) -> Self {
        self.settings.redirect_unauthenticated = redirect;
        self
    }
}

fn required_env(name: &str) -> Result<String, AuthError> {
    std::env::var(name).map_err(|_| AuthError::Config(format!("{name} is required")))
}

fn parse_url_env(name: &str, value: &str) -> Result<Url, AuthError> {
    value
        .parse()
        .map_err(|e| AuthError::Config(format!("{name}: {e}")))
}

/// Settings for [`session_transfer_relay`](super::session_transfer_relay).
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub(crate) fallback_scheme: String,
    pub(crate) trust_forwarded_headers: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            fallback_scheme: "https".into(),
            trust_forwarded_headers: false,
        }
    }
}

impl RelaySettings {
    /// Read settings from the environment.
    ///
    /// - `RELAY_FALLBACK_SCHEME`: Scheme for redirects when the request URI has none (default `https`)
    /// - `RELAY_TRUST_FORWARDED_HEADERS`: `"1"` or `"true"` to honor `X-Forwarded-Proto` / `X-Forwarded-Host`
    #[must_use]
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(scheme) = std::env::var("RELAY_FALLBACK_SCHEME") {
            settings = settings.with_fallback_scheme(scheme);
        }
        let trust = matches!(
            std::env::var("RELAY_TRUST_FORWARDED_HEADERS").as_deref(),
            Ok("1") | Ok("true"),
        );
        settings.with_trust_forwarded_headers(trust)
    }

    #[must_use]
    pub fn with_fallback_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.fallback_scheme = scheme.into();
        self
    }

    /// Only enable behind a reverse proxy that overwrites these headers.
    #[must_use]
    pub fn with_trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }
}
