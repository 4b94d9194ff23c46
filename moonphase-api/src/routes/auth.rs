/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /register` - Create an account
/// - `POST /login` - Verify credentials and issue a 24-hour session token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use moonphase_shared::{
    auth::{jwt, password},
    models::account::{Account, CreateAccount},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Username/password body shared by register and login
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    /// Username; surrounding whitespace is ignored
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing username or password"))]
    pub username: String,

    /// Password, used verbatim
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing username or password"))]
    pub password: String,
}

impl CredentialsRequest {
    /// Trims the username and validates both fields
    fn into_validated(mut self) -> ApiResult<Self> {
        self.username = self.username.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Confirmation text
    pub message: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for `/get-moon-phase`
    pub token: String,

    /// Canonical username
    pub username: String,

    /// Phase computations performed so far
    pub calculations: i64,

    /// Time of this login (RFC 3339)
    pub last_login: DateTime<Utc>,
}

/// Register a new account
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// { "username": "alice", "password": "hunter2" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "message": "Registration successful" }`
///
/// # Errors
///
/// - `400 Bad Request`: malformed body, empty username/password, or the
///   username is taken
/// - `500 Internal Server Error`: hashing or storage failure
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(req) = payload?;
    let req = req.into_validated()?;

    // The unique constraint still backs this up under concurrent registration
    if Account::find_by_username(&state.db, &req.username).await?.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let account = Account::create(
        &state.db,
        CreateAccount {
            username: req.username,
            password_hash,
        },
    )
    .await?;

    tracing::info!(account_id = %account.id, username = %account.username, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
        }),
    ))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// { "username": "alice", "password": "hunter2" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJ...",
///   "username": "alice",
///   "calculations": 3,
///   "last_login": "2024-01-12T08:30:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: malformed body or empty username/password
/// - `401 Unauthorized`: unknown username or wrong password (same message)
/// - `500 Internal Server Error`: storage or token failure
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    let req = req.into_validated()?;

    let account = match Account::find_by_username(&state.db, &req.username).await? {
        Some(account) => account,
        None => {
            tracing::warn!(username = %req.username, "Login for unknown username");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    if !password::verify_password(&req.password, &account.password_hash)? {
        tracing::warn!(username = %account.username, "Login with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let account = Account::record_login(&state.db, account.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let last_login = account
        .last_login_at
        .ok_or_else(|| ApiError::InternalError("last_login_at not set after login".to_string()))?;

    let token = jwt::issue_token(&account.username, state.jwt_secret())?;

    tracing::info!(username = %account.username, "Login successful");

    Ok(Json(LoginResponse {
        token,
        username: account.username,
        calculations: account.calculation_count,
        last_login,
    }))
}
