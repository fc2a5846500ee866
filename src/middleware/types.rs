use crate::oauth::UserInfo;
use crate::types::UserId;

/// Session data from a successful Auth0 sign-in.
///
/// Passed to [`SessionStore::create`](super::SessionStore::create) for the consumer to persist.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Auth0 user identifier (OIDC `sub` claim).
    pub user_id: UserId,
    /// Refresh token, present when `offline_access` was granted.
    pub refresh_token: Option<String>,
    /// Client `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// UserInfo snapshot taken at sign-in.
    pub user_info: UserInfo,
}
