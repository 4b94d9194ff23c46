/// Moon phase endpoint
///
/// # Endpoint
///
/// - `POST /get-moon-phase` - Phase name, illumination and rendered disk for a date

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use moonphase_shared::{
    auth::middleware::AuthContext,
    lunar::{compute_report, ephemeris::Ephemeris, phase::MoonPhase, render::DiskRenderer, PhaseReport},
    models::account::Account,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Phase query
#[derive(Debug, Deserialize)]
pub struct MoonPhaseRequest {
    /// `YYYY-MM-DD`, optionally followed by `HH:MM[:SS]` (UTC)
    #[serde(default)]
    pub date: String,
}

/// Phase result
#[derive(Debug, Serialize)]
pub struct MoonPhaseResponse {
    /// One of the eight phase names
    pub phase_name: MoonPhase,

    /// Percent illuminated, two decimals
    pub illumination: f64,

    /// Base64-encoded PNG
    pub moon_image: String,

    /// Caller's calculation count including this one
    pub calculations: i64,
}

/// Computes the phase for a date and bumps the caller's counter
///
/// # Endpoint
///
/// ```text
/// POST /get-moon-phase
/// Authorization: Bearer eyJ...
/// Content-Type: application/json
///
/// { "date": "2024-01-27" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "phase_name": "Full Moon",
///   "illumination": 99.87,
///   "moon_image": "iVBORw0KGgo...",
///   "calculations": 1
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing or unparseable date, malformed body
/// - `401 Unauthorized`: rejected by the bearer layer, or the account vanished
///   before the counter was updated
/// - `500 Internal Server Error`: ephemeris, encoding or storage failure
pub async fn get_moon_phase(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<MoonPhaseRequest>, JsonRejection>,
) -> ApiResult<Json<MoonPhaseResponse>> {
    let Json(req) = payload?;

    let date = req.date.trim();
    if date.is_empty() {
        return Err(ApiError::BadRequest("Date is required".to_string()));
    }

    let report = build_report(state.ephemeris.clone(), state.renderer, date.to_string()).await?;

    // Only successful computations are counted
    let calculations = Account::increment_calculations(&state.db, auth.account_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    tracing::info!(
        username = %auth.username,
        date,
        phase = %report.phase,
        illumination = report.illumination_percent,
        age_days = report.age_days,
        calculations,
        "Moon phase computed"
    );

    Ok(Json(MoonPhaseResponse {
        phase_name: report.phase,
        illumination: report.illumination_percent,
        moon_image: report.image_base64,
        calculations,
    }))
}

/// Runs the ephemeris and renderer on the blocking pool
///
/// Rendering is CPU-bound and grows with the canvas size.
async fn build_report(
    ephemeris: Arc<dyn Ephemeris>,
    renderer: DiskRenderer,
    date: String,
) -> ApiResult<PhaseReport> {
    let report = tokio::task::spawn_blocking(move || {
        compute_report(ephemeris.as_ref(), &renderer, &date)
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("Phase computation task failed: {}", e)))??;

    Ok(report)
}
