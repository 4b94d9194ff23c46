/// Middleware modules for the API server
///
/// - `security`: security response headers
///
/// Bearer authentication lives in `app` because it needs `AppState`.

pub mod security;
