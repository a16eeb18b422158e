/// JWT token generation and validation module
///
/// Session tokens are HS256-signed JWTs. The subject is the user ID and a
/// `usr` claim carries the public profile, so the HTTP layer can identify the
/// caller without a database round trip.
///
/// # Claims
///
/// - `sub`: user ID (as a string, per RFC 7519)
/// - `usr`: `{id, username, email}`
/// - `iss`, `iat`, `nbf`, `exp`: stamped from [`JwtSettings`]
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use warbler_shared::auth::jwt::{create_token, validate_token, Claims, JwtSettings};
/// use warbler_shared::models::user::UserSummary;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = JwtSettings::new("a-secret-of-at-least-32-characters!", "warbler", Duration::hours(24));
/// let profile = UserSummary { id: 1, username: "alice".into(), email: "alice@example.org".into() };
///
/// let token = create_token(&Claims::new(profile, &settings), &settings.secret)?;
/// let claims = validate_token(&token, &settings.secret, &settings.issuer)?;
/// assert_eq!(claims.user_id()?, 1);
/// # Ok(())
/// # }
/// ```

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::UserSummary;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Issuer claim does not match the configured issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },

    /// Subject is not a user ID
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),
}

/// Signing configuration for session tokens
#[derive(Clone)]
pub struct JwtSettings {
    /// HMAC secret; at least 32 bytes in production
    pub secret: String,

    /// Value of the `iss` claim, checked on validation
    pub issuer: String,

    /// Token lifetime
    pub expires_in: Duration,
}

impl JwtSettings {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            expires_in,
        }
    }
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: String,

    /// Public profile of the user
    pub usr: UserSummary,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims for a user, stamping issuer and expiry from `settings`
    pub fn new(profile: UserSummary, settings: &JwtSettings) -> Self {
        Self::with_expiration(profile, &settings.issuer, settings.expires_in)
    }

    /// Creates claims with an explicit lifetime
    pub fn with_expiration(profile: UserSummary, issuer: &str, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: profile.id.to_string(),
            usr: profile,
            iss: issuer.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Parses the subject back into a user ID
    pub fn user_id(&self) -> Result<i64, JwtError> {
        self.sub
            .parse()
            .map_err(|_| JwtError::InvalidSubject(self.sub.clone()))
    }
}

/// Signs claims with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// Verifies the signature, expiry, not-before time and issuer, and that the
/// subject agrees with the embedded profile.
///
/// # Errors
///
/// - `JwtError::Expired` for an expired token
/// - `JwtError::InvalidIssuer` for a foreign issuer
/// - `JwtError::InvalidSubject` for a subject that is not the profile's ID
/// - `JwtError::ValidationError` for everything else (bad signature, garbage)
pub fn validate_token(token: &str, secret: &str, issuer: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: issuer.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    let claims = token_data.claims;
    if claims.user_id()? != claims.usr.id {
        return Err(JwtError::InvalidSubject(claims.sub));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn profile() -> UserSummary {
        UserSummary {
            id: 42,
            username: "alice".to_string(),
            email: "alice@example.org".to_string(),
        }
    }

    fn settings() -> JwtSettings {
        JwtSettings::new(SECRET, "warbler", Duration::hours(24))
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(profile(), &settings());

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.usr.username, "alice");
        assert_eq!(claims.iss, "warbler");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_create_and_validate_token() {
        let token = create_token(&Claims::new(profile(), &settings()), SECRET).unwrap();

        let validated = validate_token(&token, SECRET, "warbler").expect("Should validate token");
        assert_eq!(validated.user_id().unwrap(), 42);
        assert_eq!(validated.usr, profile());
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_token(&Claims::new(profile(), &settings()), SECRET).unwrap();

        let result = validate_token(&token, "another-secret-key-at-least-32-bytes", "warbler");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_validate_with_wrong_issuer() {
        let claims = Claims::with_expiration(profile(), "someone-else", Duration::hours(1));
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_token(&token, SECRET, "warbler");
        assert!(matches!(result, Err(JwtError::InvalidIssuer { .. })));
    }

    #[test]
    fn test_validate_expired_token() {
        // Well past the default 60s leeway
        let claims = Claims::with_expiration(profile(), "warbler", Duration::seconds(-3600));
        assert!(claims.exp < Utc::now().timestamp());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(
            validate_token(&token, SECRET, "warbler"),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_validate_rejects_mismatched_subject() {
        let mut claims = Claims::new(profile(), &settings());
        claims.sub = "7".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, SECRET, "warbler"),
            Err(JwtError::InvalidSubject(_))
        ));
    }

    #[test]
    fn test_validate_garbage() {
        assert!(validate_token("not.a.jwt", SECRET, "warbler").is_err());
    }

    #[test]
    fn test_settings_debug_redacts_secret() {
        let rendered = format!("{:?}", settings());
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("<redacted>"));
    }
}
