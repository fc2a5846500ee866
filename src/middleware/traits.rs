use std::future::Future;
use std::pin::Pin;

use super::extractor::AuthUser;
use super::types::NewSession;
use crate::types::SessionId;

/// Error type returned by consumer-provided stores.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Consumer-provided session persistence.
///
/// Sessions are identified by opaque [`SessionId`]s.
/// The consumer chooses the ID format (ULID, UUID, etc.).
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStore for MyAppState {
///     async fn create(&self, session: NewSession) -> Result<SessionId, StoreError> {
///         let id = SessionId(Ulid::new().to_string());
///         self.db.insert_session(&id, &session).await?;
///         Ok(id)
///     }
///
///     async fn find(&self, session_id: &SessionId) -> Result<Option<AuthUser>, StoreError> {
///         self.db.find_session(session_id).await
///     }
///
///     async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
///         self.db.delete_session(session_id).await
///     }
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Create a new session. Returns the session ID.
    fn create(
        &self,
        session: NewSession,
    ) -> impl Future<Output = Result<SessionId, StoreError>> + Send;

    /// Look up a session by ID. Returns `AuthUser` if session is valid.
    fn find(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Option<AuthUser>, StoreError>> + Send;

    /// Delete a session (logout).
    fn delete(&self, session_id: &SessionId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe wrapper for SessionStore (needed for Arc<dyn>).
pub(super) trait SessionStoreDyn: Send + Sync {
    fn create_dyn(&self, session: NewSession) -> BoxFuture<'_, Result<SessionId, StoreError>>;

    fn find_dyn<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<AuthUser>, StoreError>>;

    fn delete_dyn<'a>(&'a self, session_id: &'a SessionId) -> BoxFuture<'a, Result<(), StoreError>>;
}

impl<T: SessionStore> SessionStoreDyn for T {
    fn create_dyn(&self, session: NewSession) -> BoxFuture<'_, Result<SessionId, StoreError>> {
        Box::pin(self.create(session))
    }

    fn find_dyn<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<AuthUser>, StoreError>> {
        Box::pin(self.find(session_id))
    }

    fn delete_dyn<'a>(&'a self, session_id: &'a SessionId) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(self.delete(session_id))
    }
}
