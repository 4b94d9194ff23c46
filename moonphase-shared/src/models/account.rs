/// Account model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id                BLOB PRIMARY KEY NOT NULL,
///     username          TEXT NOT NULL UNIQUE,
///     password_hash     TEXT NOT NULL,
///     created_at        TEXT NOT NULL,
///     last_login_at     TEXT,
///     calculation_count INTEGER NOT NULL DEFAULT 0 CHECK (calculation_count >= 0)
/// );
/// ```
///
/// Accounts are never deleted by the service. `last_login_at` changes on
/// login and `calculation_count` grows by one per successful phase query;
/// both updates are single statements, so concurrent requests for the same
/// account cannot lose writes.
///
/// # Example
///
/// ```no_run
/// use moonphase_shared::models::account::{Account, CreateAccount};
/// use moonphase_shared::db::pool::DbPool;
///
/// # async fn example(pool: DbPool) -> Result<(), sqlx::Error> {
/// let account = Account::create(&pool, CreateAccount {
///     username: "alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let count = Account::increment_calculations(&pool, account.id).await?;
/// assert_eq!(count, Some(1));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::pool::DbPool;

const COLUMNS: &str = "id, username, password_hash, created_at, last_login_at, calculation_count";

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Unique account ID (UUID v4)
    pub id: Uuid,

    /// Login name, unique and non-empty
    pub username: String,

    /// Argon2id PHC string, never the plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the account was registered
    pub created_at: DateTime<Utc>,

    /// Most recent successful login
    pub last_login_at: Option<DateTime<Utc>>,

    /// Successful phase computations so far
    pub calculation_count: i64,
}

/// Input for creating a new account
#[derive(Debug, Clone)]
pub struct CreateAccount {
    /// Login name (already trimmed and validated)
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

impl Account {
    /// Inserts a new account with a zero counter
    ///
    /// # Errors
    ///
    /// A duplicate username fails with a unique-constraint database error
    /// (`is_unique_violation()` on the inner error).
    pub async fn create(pool: &DbPool, data: CreateAccount) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts (id, username, password_hash, created_at, calculation_count)
             VALUES (?1, ?2, ?3, ?4, 0)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(Uuid::new_v4())
            .bind(data.username)
            .bind(data.password_hash)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    /// Finds an account by ID
    pub async fn find_by_id(pool: &DbPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = ?1");

        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an account by exact (case-sensitive) username
    pub async fn find_by_username(
        pool: &DbPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE username = ?1");

        sqlx::query_as::<_, Account>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Stamps `last_login_at` with the current time
    ///
    /// Returns the updated account, or None if it no longer exists.
    pub async fn record_login(pool: &DbPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE accounts SET last_login_at = ?2 WHERE id = ?1 RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .bind(Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Adds one to the calculation counter and returns the new value
    ///
    /// Returns None if the account no longer exists.
    pub async fn increment_calculations(
        pool: &DbPool,
        id: Uuid,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE accounts
             SET calculation_count = calculation_count + 1
             WHERE id = ?1
             RETURNING calculation_count",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Counts registered accounts
    pub async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

/// Whether a database error is a unique-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
