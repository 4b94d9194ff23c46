//! # Moonphase API Server Library
//!
//! HTTP surface for the moonphase service: accounts, session tokens and the
//! authenticated phase endpoint.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and bearer layer
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
