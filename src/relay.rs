//! Session transfer relay.
//!
//! Moves a session transfer token from the `session_transfer_token` query
//! parameter into the `auth0_session_transfer_token` cookie and redirects to
//! the same URL without the parameter. Browser components that cannot set
//! cookies deliver the token this way. After the redirect, the sign-in route
//! forwards the cookie to the identity provider.
//!
//! [`handle`] is a pure function of the request target. The HTTP binding lives in
//! [`middleware::session_transfer_relay`](crate::middleware::session_transfer_relay).

use std::borrow::Cow;

use cookie::{Cookie, SameSite};
use url::Url;

/// Query parameter carrying the token on first contact.
pub const SESSION_TRANSFER_TOKEN_PARAM: &str = "session_transfer_token";

/// Cookie carrying the token on subsequent requests.
pub const SESSION_TRANSFER_COOKIE: &str = "auth0_session_transfer_token";

/// The parts of an inbound request URL the relay looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    pub scheme: &'a str,
    /// `host[:port]`. `None` produces a relative redirect.
    pub authority: Option<&'a str>,
    pub path: &'a str,
    /// Raw query string without the leading `?`.
    pub query: Option<&'a str>,
}

impl<'a> RequestTarget<'a> {
    #[must_use]
    pub fn from_url(url: &'a Url) -> Self {
        Self {
            scheme: url.scheme(),
            authority: Some(url.authority()).filter(|a| !a.is_empty()),
            path: url.path(),
            query: url.query(),
        }
    }
}

/// Result of running the relay on one request.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// Set the cookie and redirect; the rest of the pipeline must not run.
    Redirect(RelayRedirect),
    /// No token in the query; forward the request unchanged.
    PassThrough,
}

/// Redirect issued when a token was found in the query string.
#[derive(Clone, PartialEq)]
pub struct RelayRedirect {
    location: String,
    cookie: Cookie<'static>,
}

impl RelayRedirect {
    /// Original URL with every `session_transfer_token` parameter removed.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn cookie(&self) -> &Cookie<'static> {
        &self.cookie
    }

    /// The transferred token (decoded).
    #[must_use]
    pub fn token(&self) -> &str {
        self.cookie.value()
    }

    /// `Set-Cookie` header value. The cookie value is percent-encoded, so the
    /// header stays valid for any token; read it back with `Cookie::parse_encoded`.
    #[must_use]
    pub fn set_cookie_header(&self) -> String {
        self.cookie.encoded().to_string()
    }
}

impl std::fmt::Debug for RelayRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayRedirect")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Decide whether a request carries a session transfer token in its query string.
///
/// - Only the first occurrence of the parameter is honored; all occurrences
///   are stripped from the redirect location.
/// - Other parameters keep their original encoding and relative order.
/// - An absent or empty token, a query that does not decode as UTF-8, or an
///   authority that does not form a valid URL all yield [`RelayOutcome::PassThrough`].
#[must_use]
pub fn handle(target: &RequestTarget<'_>) -> RelayOutcome {
    let Some(query) = target.query.filter(|q| !q.is_empty()) else {
        return RelayOutcome::PassThrough;
    };

    let Some(pairs) = parse_query(query) else {
        tracing::debug!(path = target.path, "Malformed query string, skipping session transfer");
        return RelayOutcome::PassThrough;
    };

    let Some(token) = pairs
        .iter()
        .find(|p| p.key == SESSION_TRANSFER_TOKEN_PARAM)
        .map(|p| p.value.as_ref())
    else {
        return RelayOutcome::PassThrough;
    };

    if token.is_empty() {
        return RelayOutcome::PassThrough;
    }

    let remaining = pairs
        .iter()
        .filter(|p| p.key != SESSION_TRANSFER_TOKEN_PARAM)
        .map(|p| p.raw)
        .collect::<Vec<_>>()
        .join("&");

    let Some(location) = build_location(target, &remaining) else {
        tracing::debug!(path = target.path, "Invalid request authority, skipping session transfer");
        return RelayOutcome::PassThrough;
    };

    tracing::debug!(
        path = target.path,
        "Moved session_transfer_token from query to cookie, redirecting"
    );

    RelayOutcome::Redirect(RelayRedirect {
        location,
        cookie: transfer_cookie(token),
    })
}

/// Create the relay cookie for a session transfer token.
#[must_use]
pub fn transfer_cookie(token: impl Into<String>) -> Cookie<'static> {
    Cookie::build((SESSION_TRANSFER_COOKIE, token.into()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .build()
}

struct QueryPair<'a> {
    raw: &'a str,
    key: Cow<'a, str>,
    value: Cow<'a, str>,
}

fn parse_query(query: &str) -> Option<Vec<QueryPair<'_>>> {
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|raw| {
            let (key, value) = raw.split_once('=').unwrap_or((raw, ""));
            Some(QueryPair {
                raw,
                key: decode_component(key)?,
                value: decode_component(value)?,
            })
        })
        .collect()
}

// Form decoding: `+` is a space, then percent-decoding must yield UTF-8.
fn decode_component(s: &str) -> Option<Cow<'_, str>> {
    if s.contains('+') {
        let spaced = s.replace('+', " ");
        urlencoding::decode(&spaced)
            .ok()
            .map(|decoded| Cow::Owned(decoded.into_owned()))
    } else {
        urlencoding::decode(s).ok()
    }
}

fn build_location(target: &RequestTarget<'_>, query: &str) -> Option<String> {
    let path = if target.path.is_empty() { "/" } else { target.path };

    match target.authority {
        Some(authority) => {
            if authority.contains(['/', '?', '#', '@']) {
                return None;
            }
            let mut url = Url::parse(&format!("{}://{authority}{path}", target.scheme)).ok()?;
            url.set_query(Some(query).filter(|q| !q.is_empty()));
            Some(url.into())
        }
        // `//host` would turn a relative redirect into a cross-origin one.
        None if path.starts_with("//") => None,
        None if query.is_empty() => Some(path.to_owned()),
        None => Some(format!("{path}?{query}")),
    }
}
