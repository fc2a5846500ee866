#![doc = include_str!("../README.md")]

pub mod error;
#[cfg(feature = "middleware")]
pub mod middleware;
#[cfg(feature = "oauth")]
pub mod native;
#[cfg(feature = "oauth")]
pub mod oauth;
#[cfg(feature = "oauth")]
pub mod pkce;
pub mod relay;
pub mod types;

// Re-exports for convenient access
pub use error::Error;
#[cfg(feature = "oauth")]
pub use native::{Delivery, NativeSession, WebHandoff};
#[cfg(feature = "oauth")]
pub use oauth::{
    AuthClient, AuthorizationRequest, OAuthConfig, SsoCredentials, TokenResponse, UserInfo,
    UserProfile,
};
#[cfg(feature = "oauth")]
pub use pkce::{generate_code_challenge, generate_code_verifier, generate_state};
pub use relay::{
    RelayOutcome, RelayRedirect, RequestTarget, SESSION_TRANSFER_COOKIE,
    SESSION_TRANSFER_TOKEN_PARAM,
};
pub use types::{SessionId, SessionTransferToken, UserId};
