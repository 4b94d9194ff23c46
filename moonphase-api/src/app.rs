/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use moonphase_api::{app::AppState, config::Config};
/// use moonphase_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::new(pool, config);
/// let app = moonphase_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use moonphase_shared::{
    auth::middleware::{authenticate, AuthContext},
    db::pool::DbPool,
    lunar::{
        ephemeris::{Ephemeris, MeeusEphemeris},
        render::DiskRenderer,
    },
};
use std::{future::Future, io, sync::Arc};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DbPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Source of illumination and moon age
    pub ephemeris: Arc<dyn Ephemeris>,

    /// Moon image renderer
    pub renderer: DiskRenderer,
}

impl AppState {
    /// Creates application state with the default ephemeris
    pub fn new(db: DbPool, config: Config) -> Self {
        Self::with_ephemeris(db, config, Arc::new(MeeusEphemeris))
    }

    /// Creates application state with a custom ephemeris provider
    pub fn with_ephemeris(db: DbPool, config: Config, ephemeris: Arc<dyn Ephemeris>) -> Self {
        let renderer = DiskRenderer::new(config.render.size);

        Self {
            db,
            config: Arc::new(config),
            ephemeris,
            renderer,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health          # Health check (public)
/// ├── POST /register        # Create account (public)
/// ├── POST /login           # Issue session token (public)
/// └── POST /get-moon-phase  # Phase + image for a date (Bearer token)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    // Phase routes (require a session token)
    let phase_routes = Router::new()
        .route("/get-moon-phase", post(routes::moon_phase::get_moon_phase))
        .route_layer(from_fn_with_state(state.clone(), require_account));

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .merge(auth_routes)
        .merge(phase_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Bearer authentication layer
///
/// Resolves the token to a live account and injects `AuthContext` into
/// request extensions.
async fn require_account(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Request bodies are !Sync, so don't hold a borrow of `req` across the await
    let headers = req.headers().clone();
    let account = authenticate(&state.db, &headers, state.jwt_secret()).await?;

    tracing::debug!(username = %account.username, "Request authenticated");
    req.extensions_mut().insert(AuthContext::from(&account));

    Ok(next.run(req).await)
}

/// Resolves once `signal` fires, for graceful shutdown
///
/// If the signal handler cannot be installed this never resolves, leaving
/// the server running until it is killed.
pub async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
