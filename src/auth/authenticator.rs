use tracing::{info, warn};

use super::password::verify_password_blocking;
use super::store::CredentialStore;
use super::{AuthError, SessionIdentity};

/// Check a username/password pair against the credential store.
///
/// Succeeds iff the user exists and the password verifies against the stored
/// hash. Handlers must not tell `NotFound` and `InvalidCredentials` apart in
/// what they return to the client.
pub async fn authenticate(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<SessionIdentity, AuthError> {
    let user = store
        .find_by_username(username)
        .await
        .map_err(|e| {
            tracing::error!("Credential lookup failed: {}", e);
            AuthError::Store(e.to_string())
        })?
        .ok_or_else(|| {
            warn!("Login failed: unknown user '{}'", username);
            AuthError::NotFound(username.to_string())
        })?;

    if !verify_password_blocking(password, &user.password_hash).await? {
        warn!("Login failed: bad password for '{}'", username);
        return Err(AuthError::InvalidCredentials);
    }

    info!("User '{}' logged in as {}", user.username, user.role);
    Ok(SessionIdentity {
        user_id: user.id,
        username: user.username,
        role: user.role,
    })
}
