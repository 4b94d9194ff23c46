/// Bearer authentication guard
///
/// Protected routes run [`authenticate`] before the handler. It reads the
/// `Authorization: Bearer <token>` header, validates the session token and
/// loads the account named in it, returning either the account or a typed
/// [`AuthError`] describing which step failed.
///
/// Every failure is a 401 to the client. The variants exist so the server can
/// log *why* a request was rejected (expired vs. forged vs. deleted account).
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use moonphase_shared::auth::middleware::authenticate;
/// use moonphase_shared::db::pool::DbPool;
///
/// # async fn example(pool: DbPool, headers: HeaderMap) {
/// match authenticate(&pool, &headers, "jwt-secret").await {
///     Ok(account) => println!("hello {}", account.username),
///     Err(err) => println!("rejected: {}", err),
/// }
/// # }
/// ```

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use super::jwt::{validate_token, TokenError};
use crate::db::pool::DbPool;
use crate::models::account::Account;

/// Authenticated caller, added to request extensions by the guard layer
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Account ID
    pub account_id: Uuid,

    /// Account username
    pub username: String,
}

impl From<&Account> for AuthContext {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            username: account.username.clone(),
        }
    }
}

/// Why a request failed authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header, or not `Bearer <token>`
    #[error("Invalid or missing Authorization header")]
    MissingCredentials,

    /// Token signature was valid but it has expired
    #[error("Token has expired")]
    Expired,

    /// Token could not be verified
    #[error("Invalid token")]
    InvalidToken(String),

    /// Token is valid but its username has no account
    #[error("User not found")]
    UnknownUser(String),

    /// Account lookup failed
    #[error("Database error: {0}")]
    Database(String),
}

impl AuthError {
    /// Short machine-readable reason, used in logs
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::Expired => "expired",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::UnknownUser(_) => "unknown_user",
            AuthError::Database(_) => "database",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::Expired,
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

/// Extracts the token from an `Authorization` header
///
/// The header must be exactly two whitespace-separated parts, the first being
/// `bearer` in any letter case.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MissingCredentials),
    }
}

/// Authenticates a request and loads its account
///
/// # Errors
///
/// - `MissingCredentials`: header absent or malformed
/// - `Expired`: token past its `exp`
/// - `InvalidToken`: bad signature, malformed token, missing claims
/// - `UnknownUser`: no account with the token's username
/// - `Database`: lookup failed
pub async fn authenticate(
    pool: &DbPool,
    headers: &HeaderMap,
    secret: &str,
) -> Result<Account, AuthError> {
    let token = extract_bearer(headers)?;
    let claims = validate_token(token, secret)?;

    Account::find_by_username(pool, &claims.username)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?
        .ok_or(AuthError::UnknownUser(claims.username))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_scheme_is_case_insensitive() {
        assert_eq!(extract_bearer(&headers_with("bearer tok")).unwrap(), "tok");
        assert_eq!(extract_bearer(&headers_with("BEARER  tok")).unwrap(), "tok");
    }

    #[test]
    fn test_extract_bearer_rejects_malformed() {
        assert!(matches!(
            extract_bearer(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));

        for value in ["Bearer", "Basic dXNlcjpwYXNz", "Bearer a b", "tok", ""] {
            assert!(
                matches!(
                    extract_bearer(&headers_with(value)),
                    Err(AuthError::MissingCredentials)
                ),
                "{:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_token_errors_map_to_auth_errors() {
        assert!(matches!(AuthError::from(TokenError::Expired), AuthError::Expired));
        assert!(matches!(
            AuthError::from(TokenError::Invalid("bad".to_string())),
            AuthError::InvalidToken(_)
        ));
    }

    #[test]
    fn test_reasons_are_distinct() {
        let mut reasons = vec![
            AuthError::MissingCredentials.reason(),
            AuthError::Expired.reason(),
            AuthError::InvalidToken(String::new()).reason(),
            AuthError::UnknownUser(String::new()).reason(),
            AuthError::Database(String::new()).reason(),
        ];
        reasons.sort_unstable();
        reasons.dedup();
        assert_eq!(reasons.len(), 5);
    }
}
