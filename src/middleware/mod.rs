//! Axum integration: the session transfer relay and the Auth0 sign-in routes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use auth0_session_transfer::middleware::{
//!     AuthConfig, AuthState, AuthUser, RelaySettings, auth_routes, session_transfer_relay,
//! };
//!
//! // 1. Implement SessionStore for your app
//! // 2. Configure from environment
//! let state = AuthState::new(AuthConfig::from_env()?, my_session_store);
//!
//! // 3. Mount auth routes next to your own, then put the relay in front of everything
//! let app = axum::Router::new()
//!     .route("/Account/Profile", get(|user: AuthUser| async move { user.user_id.to_string() }))
//!     .with_state(state.clone())
//!     .merge(auth_routes(state))
//!     .layer(axum::middleware::from_fn_with_state(
//!         RelaySettings::from_env(),
//!         session_transfer_relay,
//!     ));
//! ```
//!
//! The relay must wrap every route that can start a sign-in. Axum runs the
//! last added layer first, so add it last.

mod config;
mod cookies;
mod error;
mod extractor;
mod relay;
mod routes;
mod state;
mod traits;
mod types;

pub use config::{AuthConfig, RelaySettings};
pub use error::AuthError;
pub use extractor::AuthUser;
pub use relay::session_transfer_relay;
pub use routes::auth_routes;
pub use state::AuthState;
pub use traits::{SessionStore, StoreError};
pub use types::NewSession;

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
