//! The only code that writes the [`Session`].

use super::{Session, SessionStore};
use crate::api::{ApiClient, ApiError, SessionUser};
use crate::storage::DatabaseError;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Login response did not include a token")]
    MissingToken,
    #[error("Not signed in")]
    NotSignedIn,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

/// Check the fields and call `POST /login`. Touches neither the session nor
/// the disk, so it can run on a background task.
///
/// Empty fields are rejected before any request is made. A 4xx reply means
/// the server refused the credentials.
pub async fn authenticate(
    client: &ApiClient,
    username: &str,
    password: &SecretString,
) -> Result<SessionUser, AuthError> {
    if username.is_empty() || password.expose_secret().is_empty() {
        return Err(AuthError::MissingFields);
    }

    let user = match client.login(username, password).await {
        Ok(user) => user,
        Err(ApiError::HttpStatus(status)) if (400..500).contains(&status) => {
            tracing::info!(status, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !user.token.as_deref().is_some_and(|t| !t.is_empty()) {
        return Err(AuthError::MissingToken);
    }
    Ok(user)
}

/// Persist a freshly authenticated user and mark the session signed in.
pub async fn establish(
    store: &SessionStore,
    session: &mut Session,
    user: SessionUser,
) -> Result<(), AuthError> {
    store.save_user(&user).await?;
    store.set_logged_in(true).await?;
    session.set_user(user);
    session.logged_in = true;
    tracing::info!("Signed in");
    Ok(())
}

/// [`authenticate`] then [`establish`].
pub async fn sign_in(
    client: &ApiClient,
    store: &SessionStore,
    session: &mut Session,
    username: &str,
    password: &SecretString,
) -> Result<(), AuthError> {
    let user = authenticate(client, username, password).await?;
    establish(store, session, user).await
}

/// Clear the logged-in flag. The stored user is left in place.
pub async fn sign_out(store: &SessionStore, session: &mut Session) -> Result<(), AuthError> {
    store.set_logged_in(false).await?;
    session.logged_in = false;
    tracing::info!("Signed out");
    Ok(())
}

/// Replace the stored user after a profile change, keeping the flag as is.
pub async fn store_profile(
    store: &SessionStore,
    session: &mut Session,
    user: SessionUser,
) -> Result<(), AuthError> {
    if !session.is_logged_in() {
        return Err(AuthError::NotSignedIn);
    }
    store.save_user(&user).await?;
    session.set_user(user);
    Ok(())
}
