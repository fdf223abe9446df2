//! Signed-in state.
//!
//! [`Session`] is the read side handed to screens. Only [`auth`] mutates it,
//! and always together with [`SessionStore`] so memory and disk agree.

pub mod auth;

use crate::api::SessionUser;
use crate::storage::{Database, DatabaseError};
use secrecy::SecretString;

/// Persistence key for the login response JSON.
pub const USER_KEY: &str = "user";
/// Persistence key for the logged-in flag (`"true"` / `"false"`).
pub const LOGGED_IN_KEY: &str = "loggedIn";

/// Current user and token, if any.
#[derive(Debug, Default)]
pub struct Session {
    user: Option<SessionUser>,
    token: Option<SecretString>,
    logged_in: bool,
}

impl Session {
    /// A session with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Signed in with a usable token.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in && self.token.is_some()
    }

    pub fn token(&self) -> Option<&SecretString> {
        if self.logged_in {
            self.token.as_ref()
        } else {
            None
        }
    }

    /// The stored user. Still available after sign-out, as the flag is the
    /// only thing sign-out clears.
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    fn set_user(&mut self, user: SessionUser) {
        self.token = user.token.clone().map(SecretString::from);
        self.user = Some(user);
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Reads and writes the session keys in the local database.
#[derive(Clone)]
pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Rebuild the session from disk.
    ///
    /// A stored user that no longer decodes is discarded with a warning and
    /// the session starts signed out.
    pub async fn load(&self) -> Result<Session, DatabaseError> {
        let logged_in = self
            .db
            .get_value(LOGGED_IN_KEY)
            .await?
            .is_some_and(|v| v == "true");

        let user = match self.db.get_json::<SessionUser>(USER_KEY).await {
            Ok(user) => user,
            Err(DatabaseError::Json { source, .. }) => {
                tracing::warn!(error = %source, "Stored session user is unreadable; signing out");
                self.set_logged_in(false).await?;
                return Ok(Session::anonymous());
            }
            Err(e) => return Err(e),
        };

        let mut session = Session::anonymous();
        if let Some(user) = user {
            session.set_user(user);
        }
        session.logged_in = logged_in && session.token.is_some();
        tracing::debug!(logged_in = session.logged_in, "Session loaded");
        Ok(session)
    }

    pub(crate) async fn save_user(&self, user: &SessionUser) -> Result<(), DatabaseError> {
        self.db.set_json(USER_KEY, user).await
    }

    pub(crate) async fn set_logged_in(&self, logged_in: bool) -> Result<(), DatabaseError> {
        self.db
            .set_value(LOGGED_IN_KEY, if logged_in { "true" } else { "false" })
            .await
    }

    /// Remove both keys (`--reset-session`).
    pub async fn clear(&self) -> Result<(), DatabaseError> {
        self.db.delete_value(USER_KEY).await?;
        self.db.delete_value(LOGGED_IN_KEY).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    async fn test_store() -> SessionStore {
        SessionStore::new(Database::open(":memory:").await.unwrap())
    }

    fn user_with_token(token: &str) -> SessionUser {
        SessionUser {
            token: Some(token.to_string()),
            ..SessionUser::default()
        }
    }

    #[tokio::test]
    async fn test_empty_store_is_anonymous() {
        let store = test_store().await;
        let session = store.load().await.unwrap();
        assert!(!session.is_logged_in());
        assert!(session.user().is_none());
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn test_load_signed_in() {
        let store = test_store().await;
        store.save_user(&user_with_token("abc")).await.unwrap();
        store.set_logged_in(true).await.unwrap();

        let session = store.load().await.unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.token().unwrap().expose_secret(), "abc");
    }

    #[tokio::test]
    async fn test_flag_false_keeps_user_but_not_token() {
        let store = test_store().await;
        store.save_user(&user_with_token("abc")).await.unwrap();
        store.set_logged_in(false).await.unwrap();

        let session = store.load().await.unwrap();
        assert!(!session.is_logged_in());
        assert!(session.user().is_some());
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn test_user_without_token_is_not_logged_in() {
        let store = test_store().await;
        store.save_user(&SessionUser::default()).await.unwrap();
        store.set_logged_in(true).await.unwrap();
        assert!(!store.load().await.unwrap().is_logged_in());
    }

    #[tokio::test]
    async fn test_corrupt_user_resets() {
        let store = test_store().await;
        store.db.set_value(USER_KEY, "{broken").await.unwrap();
        store.set_logged_in(true).await.unwrap();

        let session = store.load().await.unwrap();
        assert!(!session.is_logged_in());
        assert_eq!(
            store.db.get_value(LOGGED_IN_KEY).await.unwrap().as_deref(),
            Some("false")
        );
    }

    #[tokio::test]
    async fn test_clear_removes_keys() {
        let store = test_store().await;
        store.save_user(&user_with_token("abc")).await.unwrap();
        store.set_logged_in(true).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.db.get_value(USER_KEY).await.unwrap().is_none());
        assert!(store.db.get_value(LOGGED_IN_KEY).await.unwrap().is_none());
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let mut session = Session::anonymous();
        session.set_user(user_with_token("super-secret"));
        assert!(!format!("{:?}", session).contains("super-secret"));
    }
}
