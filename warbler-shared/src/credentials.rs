//! Registration, login and session tokens
//!
//! [`CredentialService`] owns the account lifecycle: it creates users with
//! hashed passwords, checks credentials at login, and signs and verifies the
//! session tokens the HTTP layer hands out.
//!
//! Outcomes a client can cause (a taken username, a wrong password) are
//! returned as enum variants rather than errors, so only genuine failures
//! travel through [`CredentialError`].
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, OnceLock};
//! use chrono::Duration;
//! use warbler_shared::auth::jwt::JwtSettings;
//! use warbler_shared::credentials::{Authentication, CredentialService, Registration};
//! use warbler_shared::store::memory::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let jwt = JwtSettings::new("a-secret-of-at-least-32-characters!", "warbler", Duration::hours(24));
//! let credentials = CredentialService::new(Arc::new(MemoryStore::new()), jwt);
//!
//! let Registration::Created(user) = credentials
//!     .register_if_available("alice", "alice@example.org", "alice@password")
//!     .await?
//! else {
//!     unreachable!("empty store");
//! };
//!
//! let outcome = credentials
//!     .authenticate(Some("alice"), None, "alice@password")
//!     .await?;
//! assert!(matches!(outcome, Authentication::Authenticated(u) if u.id == user.id));
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::auth::jwt::{create_token, validate_token, Claims, JwtError, JwtSettings};
use crate::auth::password::{hash_password, verify_password, PasswordError};
use crate::models::user::{CreateUser, User};
use crate::store::{Store, StoreError};

/// Error type for credential operations
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),

    /// The blocking hashing task panicked or was cancelled
    #[error("Password task failed: {0}")]
    Task(String),
}

/// Result of a registration attempt
#[derive(Debug)]
pub enum Registration {
    Created(User),

    /// Username or email already belongs to another account
    Conflict,
}

/// Result of a login attempt
#[derive(Debug)]
pub enum Authentication {
    Authenticated(User),

    /// Unknown account or wrong password; the two are not distinguished
    InvalidCredentials,
}

#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn Store>,
    jwt: JwtSettings,
}

impl CredentialService {
    pub fn new(store: Arc<dyn Store>, jwt: JwtSettings) -> Self {
        Self { store, jwt }
    }

    pub fn jwt_settings(&self) -> &JwtSettings {
        &self.jwt
    }

    /// Creates an account unless the username or email is taken
    ///
    /// Availability is checked up front; a concurrent registration that wins
    /// the race is caught by the store's unique constraints and reported as
    /// [`Registration::Conflict`] as well.
    pub async fn register_if_available(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, CredentialError> {
        if self.store.find_user_by_username(username).await?.is_some() {
            debug!(username, "Registration rejected: username taken");
            return Ok(Registration::Conflict);
        }
        if self.store.find_user_by_email(email).await?.is_some() {
            debug!(username, "Registration rejected: email taken");
            return Ok(Registration::Conflict);
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))??;

        let created = self
            .store
            .create_user(CreateUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await;

        match created {
            Ok(user) => {
                info!(user_id = user.id, username = %user.username, "Registered user");
                Ok(Registration::Created(user))
            }
            Err(StoreError::UniqueViolation(constraint)) => {
                debug!(username, constraint, "Registration lost a uniqueness race");
                Ok(Registration::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks a password against the account named by username or email
    ///
    /// The username takes precedence when both are given; an empty string
    /// counts as absent. With neither, the attempt is simply invalid. Unknown
    /// accounts still pay for one Argon2 verification.
    pub async fn authenticate(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> Result<Authentication, CredentialError> {
        let username = username.filter(|u| !u.is_empty());
        let email = email.filter(|e| !e.is_empty());

        let user = match (username, email) {
            (Some(username), _) => self.store.find_user_by_username(username).await?,
            (None, Some(email)) => self.store.find_user_by_email(email).await?,
            (None, None) => None,
        };

        let Some(user) = user else {
            let password = password.to_string();
            tokio::task::spawn_blocking(move || {
                if let Some(hash) = placeholder_hash() {
                    let _ = verify_password(&password, hash);
                }
            })
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))?;

            debug!("Login rejected: no such account");
            return Ok(Authentication::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))??;

        if matches {
            debug!(user_id = user.id, "Login accepted");
            Ok(Authentication::Authenticated(user))
        } else {
            debug!(user_id = user.id, "Login rejected: wrong password");
            Ok(Authentication::InvalidCredentials)
        }
    }

    /// Signs a session token for `user`
    pub fn issue_token(&self, user: &User) -> Result<String, CredentialError> {
        let claims = Claims::new(user.summary(), &self.jwt);
        Ok(create_token(&claims, &self.jwt.secret)?)
    }

    /// Validates a session token and returns its claims
    pub fn verify_token(&self, token: &str) -> Result<Claims, CredentialError> {
        Ok(validate_token(token, &self.jwt.secret, &self.jwt.issuer)?)
    }
}

/// Hash checked against when the account does not exist
///
/// Computed once, on the blocking pool, from a password no client can know.
fn placeholder_hash() -> Option<&'static str> {
    static PLACEHOLDER: OnceLock<Option<String>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| hash_password("warbler-placeholder-account").ok())
        .as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::Duration;

    fn service() -> CredentialService {
        let jwt = JwtSettings::new(
            "test-secret-key-at-least-32-bytes-long",
            "warbler",
            Duration::hours(1),
        );
        CredentialService::new(Arc::new(MemoryStore::new()), jwt)
    }

    async fn register(service: &CredentialService, name: &str) -> User {
        match service
            .register_if_available(name, &format!("{name}@example.org"), "pw123456")
            .await
            .unwrap()
        {
            Registration::Created(user) => user,
            Registration::Conflict => panic!("{name} should be available"),
        }
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let service = service();
        let user = register(&service, "alice").await;

        assert_ne!(user.password_hash, "pw123456");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_conflicts_on_username_or_email() {
        let service = service();
        register(&service, "alice").await;

        let same_name = service
            .register_if_available("alice", "other@example.org", "pw")
            .await
            .unwrap();
        assert!(matches!(same_name, Registration::Conflict));

        let same_email = service
            .register_if_available("alicia", "alice@example.org", "pw")
            .await
            .unwrap();
        assert!(matches!(same_email, Registration::Conflict));
    }

    #[tokio::test]
    async fn test_authenticate_by_username_or_email() {
        let service = service();
        let user = register(&service, "bob").await;

        let by_name = service.authenticate(Some("bob"), None, "pw123456").await.unwrap();
        assert!(matches!(by_name, Authentication::Authenticated(u) if u.id == user.id));

        let by_email = service
            .authenticate(None, Some("bob@example.org"), "pw123456")
            .await
            .unwrap();
        assert!(matches!(by_email, Authentication::Authenticated(u) if u.id == user.id));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_credentials() {
        let service = service();
        register(&service, "bob").await;

        let wrong_password = service.authenticate(Some("bob"), None, "nope").await.unwrap();
        assert!(matches!(wrong_password, Authentication::InvalidCredentials));

        let unknown = service.authenticate(Some("zed"), None, "pw123456").await.unwrap();
        assert!(matches!(unknown, Authentication::InvalidCredentials));

        let nothing = service.authenticate(None, None, "pw123456").await.unwrap();
        assert!(matches!(nothing, Authentication::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_treats_empty_username_as_absent() {
        let service = service();
        let user = register(&service, "bob").await;

        let outcome = service
            .authenticate(Some(""), Some("bob@example.org"), "pw123456")
            .await
            .unwrap();
        assert!(matches!(outcome, Authentication::Authenticated(u) if u.id == user.id));

        let nothing = service.authenticate(Some(""), Some(""), "pw123456").await.unwrap();
        assert!(matches!(nothing, Authentication::InvalidCredentials));
    }

    #[test]
    fn test_placeholder_hash_is_valid_and_never_matches() {
        let hash = placeholder_hash().expect("placeholder hash is computed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("pw123456", hash).unwrap());
        assert_eq!(placeholder_hash(), Some(hash));
    }

    #[tokio::test]
    async fn test_issued_token_verifies_to_user() {
        let service = service();
        let user = register(&service, "carol").await;

        let token = service.issue_token(&user).unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.usr, user.summary());
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage() {
        let result = service().verify_token("not-a-token");
        assert!(matches!(result, Err(CredentialError::Token(_))));
    }
}
