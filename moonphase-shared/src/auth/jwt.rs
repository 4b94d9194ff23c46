/// Session tokens
///
/// Sessions are stateless HS256 JWTs. The payload carries the account's
/// username and an expiry 24 hours after issuance; nothing is stored server
/// side and there is no revocation, so a token is valid until it expires.
///
/// ```json
/// { "username": "alice", "exp": 1704931200 }
/// ```
///
/// Validation distinguishes an expired token from every other failure so the
/// caller can log the difference. Both end up as 401 responses.
///
/// # Example
///
/// ```
/// use moonphase_shared::auth::jwt::{issue_token, validate_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-that-is-at-least-32-bytes-long";
/// let token = issue_token("alice", secret)?;
///
/// let claims = validate_token(&token, secret)?;
/// assert_eq!(claims.username, "alice");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Lifetime of a session token
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign token
    #[error("Failed to create token: {0}")]
    Create(String),

    /// Signature valid but `exp` has passed
    #[error("Token has expired")]
    Expired,

    /// Bad signature, malformed token, wrong algorithm or missing claims
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Session token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account username
    pub username: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Claims for a fresh session
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_expiration(username, Duration::hours(SESSION_LIFETIME_HOURS))
    }

    /// Claims expiring `expires_in` from now (negative values are already expired)
    pub fn with_expiration(username: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            username: username.into(),
            exp: (Utc::now() + expires_in).timestamp(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| TokenError::Create(e.to_string()))
}

/// Issues a 24-hour session token for `username`
pub fn issue_token(username: &str, secret: &str) -> Result<String, TokenError> {
    create_token(&Claims::new(username), secret)
}

/// Verifies signature and expiry, returning the claims
///
/// Expiry is checked with zero leeway.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}
