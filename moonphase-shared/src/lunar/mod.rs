/// Lunar computations
///
/// # Modules
///
/// - [`ephemeris`]: illumination and moon age for an instant
/// - [`phase`]: eight-way phase classification from moon age
/// - [`render`]: lit/shadowed disk bitmap, PNG + base64 encoded
///
/// [`compute_report`] chains the three for one query date.
///
/// # Example
///
/// ```
/// use moonphase_shared::lunar::{compute_report, ephemeris::MeeusEphemeris, render::DiskRenderer};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = compute_report(&MeeusEphemeris, &DiskRenderer::new(100), "2024-01-27")?;
/// assert_eq!(report.phase.as_str(), "Full Moon");
/// # Ok(())
/// # }
/// ```

pub mod ephemeris;
pub mod phase;
pub mod render;

use ephemeris::{parse_query_date, Ephemeris, EphemerisError};
use phase::MoonPhase;
use render::{DiskRenderer, RenderError};

/// Error type for a full phase computation
#[derive(Debug, thiserror::Error)]
pub enum LunarError {
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result of one phase query
#[derive(Debug, Clone)]
pub struct PhaseReport {
    /// Named phase
    pub phase: MoonPhase,

    /// Illuminated percentage, rounded to two decimals
    pub illumination_percent: f64,

    /// Days since the preceding new moon
    pub age_days: f64,

    /// Base64 PNG of the rendered disk
    pub image_base64: String,
}

/// Parses `date`, observes the Moon, classifies and renders it
///
/// The image is drawn from the unrounded illumination.
pub fn compute_report(
    ephemeris: &dyn Ephemeris,
    renderer: &DiskRenderer,
    date: &str,
) -> Result<PhaseReport, LunarError> {
    let at = parse_query_date(date)?;
    let observation = ephemeris.observe(at)?;
    let image_base64 = renderer.render_base64(observation.illumination_percent)?;

    Ok(PhaseReport {
        phase: observation.phase(),
        illumination_percent: round_to_hundredths(observation.illumination_percent),
        age_days: observation.age_days,
        image_base64,
    })
}

/// Rounds to two decimals, exact ties going to the even neighbour
fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use ephemeris::LunarObservation;

    struct Fixed(f64, f64);

    impl Ephemeris for Fixed {
        fn observe(&self, _at: NaiveDateTime) -> Result<LunarObservation, EphemerisError> {
            LunarObservation::new(self.0, self.1)
        }
    }

    #[test]
    fn test_report_uses_provider_values() {
        let report = compute_report(&Fixed(12.3456, 5.0), &DiskRenderer::new(32), "2020-05-05")
            .unwrap();
        assert_eq!(report.phase, MoonPhase::WaxingCrescent);
        assert_eq!(report.illumination_percent, 12.35);
        assert!(!report.image_base64.is_empty());
    }

    #[test]
    fn test_invalid_date_short_circuits() {
        let result = compute_report(&Fixed(50.0, 7.0), &DiskRenderer::new(32), "not-a-date");
        assert!(matches!(
            result,
            Err(LunarError::Ephemeris(EphemerisError::InvalidDate(_)))
        ));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to_hundredths(0.004), 0.0);
        assert_eq!(round_to_hundredths(99.996), 100.0);
    }

    #[test]
    fn test_rounding_ties_go_to_even() {
        // Exactly representable ties
        assert_eq!(round_to_hundredths(42.125), 42.12);
        assert_eq!(round_to_hundredths(42.375), 42.38);
        assert_eq!(round_to_hundredths(0.625), 0.62);
    }

    #[test]
    fn test_report_rounds_exact_tie_to_even() {
        let report = compute_report(&Fixed(37.625, 5.0), &DiskRenderer::new(32), "2020-05-05")
            .unwrap();
        assert_eq!(report.illumination_percent, 37.62);
    }
}
