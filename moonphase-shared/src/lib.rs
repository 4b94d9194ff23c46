//! # Moonphase Shared Library
//!
//! Domain logic behind the moonphase API server: lunar computations, account
//! storage and authentication.
//!
//! ## Module Organization
//!
//! - `lunar`: ephemeris, phase classification and disk rendering
//! - `auth`: password hashing, session tokens and the bearer guard
//! - `db`: connection pool and migrations
//! - `models`: database models

pub mod auth;
pub mod db;
pub mod lunar;
pub mod models;

/// Current version of the moonphase shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
