/// Database models
///
/// # Models
///
/// - `account`: registered users, their password hashes and usage counters
///
/// # Example
///
/// ```no_run
/// use moonphase_shared::models::account::{Account, CreateAccount};
/// use moonphase_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::in_memory()).await?;
///
/// let account = Account::create(&pool, CreateAccount {
///     username: "alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod account;
