/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `moon_phase`: Phase computation (authenticated)

pub mod auth;
pub mod health;
pub mod moon_phase;
