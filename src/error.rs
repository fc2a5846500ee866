#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Authentication API failure (authorize, token, userinfo, session transfer exchange).
    #[error("Authentication failed during {operation}: {detail}")]
    Authentication {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
    /// Management API failure (user profile and metadata).
    #[error("Management API call failed during {operation}: {detail}")]
    Management {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
    #[cfg(feature = "oauth")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Not signed in")]
    NotSignedIn,
    #[error("No refresh token available; sign in with offline_access to use session transfer")]
    MissingRefreshToken,
}

impl Error {
    /// HTTP status returned by the identity provider, if the failure came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Management { status, .. } => *status,
            #[cfg(feature = "oauth")]
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::NotSignedIn | Self::MissingRefreshToken => None,
        }
    }
}
