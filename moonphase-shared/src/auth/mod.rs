/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: 24-hour HS256 session tokens carrying the username
/// - [`middleware`]: bearer guard resolving a request to an account
///
/// # Example
///
/// ```no_run
/// use moonphase_shared::auth::password::{hash_password, verify_password};
/// use moonphase_shared::auth::jwt::{issue_token, validate_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = issue_token("alice", "secret-key-at-least-32-bytes-long!!")?;
/// let claims = validate_token(&token, "secret-key-at-least-32-bytes-long!!")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
