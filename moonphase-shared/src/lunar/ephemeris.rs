/// Lunar ephemeris
///
/// Provides the two quantities the service needs for a given instant:
/// the illuminated percentage of the Moon's disk and the Moon's age in days
/// since the preceding new moon.
///
/// The default provider, [`MeeusEphemeris`], uses the analytic series from
/// Jean Meeus, *Astronomical Algorithms* (2nd ed.):
///
/// - **Illumination**: phase angle from the low-precision lunar theory
///   (chapter 48), accurate to a few hundredths of a percent of the disk.
/// - **New moon instants**: mean lunation plus periodic and planetary
///   corrections (chapter 49), accurate to well under a minute.
///
/// Terrestrial Time is treated as UT. The difference (about 70 seconds in this
/// era) is negligible next to the 3.7 day width of a phase bucket.
///
/// # Example
///
/// ```
/// use moonphase_shared::lunar::ephemeris::{parse_query_date, Ephemeris, MeeusEphemeris};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let at = parse_query_date("2024-01-12")?;
/// let observation = MeeusEphemeris.observe(at)?;
/// assert!(observation.illumination_percent < 5.0);
/// # Ok(())
/// # }
/// ```

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::phase::{MoonPhase, SYNODIC_MONTH};

/// Julian Day of the Unix epoch (1970-01-01T00:00:00Z)
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian Day of the first new moon of 2000 (lunation k = 0)
const LUNATION_ZERO_JDE: f64 = 2_451_550.09766;

/// Mean synodic month used by the lunation series
const MEAN_LUNATION: f64 = 29.530588861;

/// Julian Day of J2000.0
const J2000: f64 = 2_451_545.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Earliest year the series are trusted for
pub const MIN_YEAR: i32 = -4000;

/// Latest year the series are trusted for
pub const MAX_YEAR: i32 = 8000;

/// Accepted input layouts, tried in order
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Error type for ephemeris operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EphemerisError {
    /// Date string could not be parsed
    #[error("Invalid date format; use YYYY-MM-DD")]
    InvalidDate(String),

    /// Provider produced a value outside its contract
    #[error("Ephemeris produced an invalid {field}: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Moon state at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunarObservation {
    /// Illuminated share of the disk, 0 to 100
    pub illumination_percent: f64,

    /// Days since the preceding new moon
    pub age_days: f64,
}

impl LunarObservation {
    /// Builds an observation, enforcing the provider contract
    ///
    /// Illumination is clamped to [0, 100] to absorb rounding at the extremes.
    /// Non-finite values, negative ages and ages longer than any real lunation
    /// are rejected.
    pub fn new(illumination_percent: f64, age_days: f64) -> Result<Self, EphemerisError> {
        if !illumination_percent.is_finite() {
            return Err(EphemerisError::OutOfRange {
                field: "illumination",
                value: illumination_percent,
            });
        }

        if !age_days.is_finite() || !(0.0..MAX_AGE_DAYS).contains(&age_days) {
            return Err(EphemerisError::OutOfRange {
                field: "age",
                value: age_days,
            });
        }

        Ok(Self {
            illumination_percent: illumination_percent.clamp(0.0, 100.0),
            age_days,
        })
    }

    /// Named phase for this observation's age
    pub fn phase(&self) -> MoonPhase {
        MoonPhase::from_age(self.age_days)
    }
}

/// Source of lunar observations
///
/// Implementations must return illumination in [0, 100] and an age in
/// [0, synodic month), allowing for floating-point slop at the upper end.
pub trait Ephemeris: Send + Sync {
    /// Observes the Moon at a UTC instant
    fn observe(&self, at: NaiveDateTime) -> Result<LunarObservation, EphemerisError>;
}

/// Parses a query date into a UTC instant
///
/// Accepts `YYYY-MM-DD` (midnight UTC), `YYYY-MM-DD HH:MM` and
/// `YYYY-MM-DD HH:MM:SS`. Surrounding whitespace is ignored.
///
/// Years outside `MIN_YEAR..=MAX_YEAR` are rejected as invalid dates.
pub fn parse_query_date(input: &str) -> Result<NaiveDateTime, EphemerisError> {
    let trimmed = input.trim();

    let parsed = match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => date.and_hms_opt(0, 0, 0),
        Err(_) => DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok()),
    };

    parsed
        .filter(|at| (MIN_YEAR..=MAX_YEAR).contains(&at.year()))
        .ok_or_else(|| EphemerisError::InvalidDate(input.to_string()))
}

/// Julian Day of a UTC instant
pub fn julian_day(at: NaiveDateTime) -> f64 {
    let utc = at.and_utc();
    let seconds = utc.timestamp() as f64 + utc.timestamp_subsec_nanos() as f64 * 1e-9;
    UNIX_EPOCH_JD + seconds / SECONDS_PER_DAY
}

/// Analytic ephemeris after Meeus
#[derive(Debug, Clone, Copy, Default)]
pub struct MeeusEphemeris;

impl Ephemeris for MeeusEphemeris {
    fn observe(&self, at: NaiveDateTime) -> Result<LunarObservation, EphemerisError> {
        let jd = julian_day(at);
        let illumination = illuminated_fraction(jd) * 100.0;
        let age = jd - previous_new_moon(jd);

        tracing::debug!(jd, illumination, age, "Computed lunar observation");

        LunarObservation::new(illumination, age)
    }
}

/// Illuminated fraction of the disk (0 to 1) at Julian Day `jd`
pub fn illuminated_fraction(jd: f64) -> f64 {
    let t = (jd - J2000) / 36525.0;
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    // Mean elongation of the Moon
    let d = 297.8501921 + 445_267.1114034 * t - 0.0018819 * t2 + t3 / 545_868.0
        - t4 / 113_065_000.0;
    // Mean anomaly of the Sun
    let m = 357.5291092 + 35_999.0502909 * t - 0.0001536 * t2 + t3 / 24_490_000.0;
    // Mean anomaly of the Moon
    let mp = 134.9633964 + 477_198.8675055 * t + 0.0087414 * t2 + t3 / 69_699.0
        - t4 / 14_712_000.0;

    let phase_angle = 180.0 - d - 6.289 * sin_deg(mp) + 2.100 * sin_deg(m)
        - 1.274 * sin_deg(2.0 * d - mp)
        - 0.658 * sin_deg(2.0 * d)
        - 0.214 * sin_deg(2.0 * mp)
        - 0.110 * sin_deg(d);

    (1.0 + cos_deg(phase_angle)) / 2.0
}

/// Julian Day of the last new moon at or before `jd`
pub fn previous_new_moon(jd: f64) -> f64 {
    let mut k = ((jd - LUNATION_ZERO_JDE) / MEAN_LUNATION).floor();

    // The mean estimate can be off by one lunation near a conjunction
    while new_moon(k) > jd {
        k -= 1.0;
    }
    while new_moon(k + 1.0) <= jd {
        k += 1.0;
    }

    new_moon(k)
}

/// Julian Ephemeris Day of the true new moon for lunation `k`
///
/// `k = 0` is the new moon of 2000-01-06; negative values reach back.
pub fn new_moon(k: f64) -> f64 {
    let t = k / 1236.85;
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let mean = LUNATION_ZERO_JDE + MEAN_LUNATION * k + 0.00015437 * t2 - 0.000000150 * t3
        + 0.00000000073 * t4;

    // Eccentricity of Earth's orbit
    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;

    // Sun's mean anomaly
    let m = 2.5534 + 29.10535670 * k - 0.0000014 * t2 - 0.00000011 * t3;
    // Moon's mean anomaly
    let mp = 201.5643 + 385.81693528 * k + 0.0107582 * t2 + 0.00001238 * t3
        - 0.000000058 * t4;
    // Moon's argument of latitude
    let f = 160.7108 + 390.67050284 * k - 0.0016118 * t2 - 0.00000227 * t3
        + 0.000000011 * t4;
    // Longitude of the ascending node
    let omega = 124.7746 - 1.56375588 * k + 0.0020672 * t2 + 0.00000215 * t3;

    let periodic = -0.40720 * sin_deg(mp)
        + 0.17241 * e * sin_deg(m)
        + 0.01608 * sin_deg(2.0 * mp)
        + 0.01039 * sin_deg(2.0 * f)
        + 0.00739 * e * sin_deg(mp - m)
        - 0.00514 * e * sin_deg(mp + m)
        + 0.00208 * e * e * sin_deg(2.0 * m)
        - 0.00111 * sin_deg(mp - 2.0 * f)
        - 0.00057 * sin_deg(mp + 2.0 * f)
        + 0.00056 * e * sin_deg(2.0 * mp + m)
        - 0.00042 * sin_deg(3.0 * mp)
        + 0.00042 * e * sin_deg(m + 2.0 * f)
        + 0.00038 * e * sin_deg(m - 2.0 * f)
        - 0.00024 * e * sin_deg(2.0 * mp - m)
        - 0.00017 * sin_deg(omega)
        - 0.00007 * sin_deg(mp + 2.0 * m)
        + 0.00004 * sin_deg(2.0 * mp - 2.0 * f)
        + 0.00004 * sin_deg(3.0 * m)
        + 0.00003 * sin_deg(mp + m - 2.0 * f)
        + 0.00003 * sin_deg(2.0 * mp + 2.0 * f)
        - 0.00003 * sin_deg(mp + m + 2.0 * f)
        + 0.00003 * sin_deg(mp - m + 2.0 * f)
        - 0.00002 * sin_deg(mp - m - 2.0 * f)
        - 0.00002 * sin_deg(3.0 * mp + m)
        + 0.00002 * sin_deg(4.0 * mp);

    // (coefficient, constant, rate per lunation)
    const PLANETARY: [(f64, f64, f64); 14] = [
        (0.000325, 299.77, 0.107408),
        (0.000165, 251.88, 0.016321),
        (0.000164, 251.83, 26.651886),
        (0.000126, 349.42, 36.412478),
        (0.000110, 84.66, 18.206239),
        (0.000062, 141.74, 53.303771),
        (0.000060, 207.14, 2.453732),
        (0.000056, 154.84, 7.306860),
        (0.000047, 34.52, 27.261239),
        (0.000042, 207.19, 0.121824),
        (0.000040, 291.34, 1.844379),
        (0.000037, 161.72, 24.198154),
        (0.000035, 239.56, 25.513099),
        (0.000023, 331.55, 3.592518),
    ];

    let planetary: f64 = PLANETARY
        .iter()
        .enumerate()
        .map(|(i, (coefficient, base, rate))| {
            let mut argument = base + rate * k;
            if i == 0 {
                argument -= 0.009173 * t2;
            }
            coefficient * sin_deg(argument)
        })
        .sum();

    mean + periodic + planetary
}

fn sin_deg(degrees: f64) -> f64 {
    degrees.to_radians().sin()
}

fn cos_deg(degrees: f64) -> f64 {
    degrees.to_radians().cos()
}

/// Upper bound on a valid age, allowing for lunation length variation
pub const MAX_AGE_DAYS: f64 = SYNODIC_MONTH + 0.75;

#[cfg(test)]
mod tests {
    use super::*;

    fn at(input: &str) -> NaiveDateTime {
        parse_query_date(input).expect("test date should parse")
    }

    #[test]
    fn test_parse_plain_date_is_midnight() {
        let parsed = at("2024-01-11");
        assert_eq!(parsed.to_string(), "2024-01-11 00:00:00");
    }

    #[test]
    fn test_parse_date_with_time() {
        assert_eq!(at("2024-01-11 12:30").to_string(), "2024-01-11 12:30:00");
        assert_eq!(at(" 2024-01-11 12:30:15 ").to_string(), "2024-01-11 12:30:15");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "yesterday", "2024-13-01", "2024-02-30", "11/01/2024", "2024-01"] {
            assert!(
                matches!(parse_query_date(input), Err(EphemerisError::InvalidDate(_))),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_years_outside_window() {
        for input in ["-262143-01-01", "-4001-12-31", "8001-01-01", "9000-01-01 12:00"] {
            assert!(
                matches!(parse_query_date(input), Err(EphemerisError::InvalidDate(_))),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_accepts_window_edges() {
        assert_eq!(at("-4000-01-01").year(), MIN_YEAR);
        assert_eq!(at("8000-12-31 23:59:59").year(), MAX_YEAR);
        assert_eq!(at("-3000-06-01").year(), -3000);
    }

    #[test]
    fn test_julian_day_reference_points() {
        assert!((julian_day(at("2000-01-01 12:00")) - J2000).abs() < 1e-9);
        assert!((julian_day(at("1970-01-01")) - UNIX_EPOCH_JD).abs() < 1e-9);
        assert!((julian_day(at("1992-04-12")) - 2_448_724.5).abs() < 1e-9);
    }

    #[test]
    fn test_new_moon_matches_reference_lunation() {
        // New moon of 1977 February, lunation -283
        let jde = new_moon(-283.0);
        assert!((jde - 2_443_192.65118).abs() < 1e-4, "got {}", jde);
    }

    #[test]
    fn test_illumination_matches_reference() {
        // 1992 April 12, 0h: about 68% illuminated
        let k = illuminated_fraction(2_448_724.5);
        assert!((k - 0.68).abs() < 0.01, "got {}", k);
    }

    #[test]
    fn test_previous_new_moon_brackets_instant() {
        for date in ["2023-12-13", "2024-01-11", "2024-01-12", "2024-06-01", "1999-12-31"] {
            let jd = julian_day(at(date));
            let previous = previous_new_moon(jd);
            assert!(previous <= jd);
            assert!(jd - previous < MAX_AGE_DAYS, "{} age {}", date, jd - previous);
        }
    }

    #[test]
    fn test_new_moon_of_january_2024() {
        // Conjunction at 2024-01-11 11:57 UTC
        let jd = julian_day(at("2024-01-11 12:00"));
        let expected = julian_day(at("2024-01-11 11:57"));
        assert!((previous_new_moon(jd) - expected).abs() < 0.01);
    }

    #[test]
    fn test_observe_around_new_moon() {
        let eve = MeeusEphemeris.observe(at("2024-01-11")).unwrap();
        assert!(eve.illumination_percent < 2.0);
        assert!(eve.age_days > 28.5);
        assert_eq!(eve.phase(), MoonPhase::WaningCrescent);

        let after = MeeusEphemeris.observe(at("2024-01-12")).unwrap();
        assert!(after.illumination_percent < 2.0);
        assert!(after.age_days < 1.0);
        assert_eq!(after.phase(), MoonPhase::NewMoon);
    }

    #[test]
    fn test_observe_after_full_moon() {
        // Full moon at 2024-01-25 17:54 UTC
        let observation = MeeusEphemeris.observe(at("2024-01-27")).unwrap();
        assert!(observation.illumination_percent > 90.0);
        assert_eq!(observation.phase(), MoonPhase::FullMoon);
    }

    #[test]
    fn test_observe_near_first_quarter() {
        // First quarter at 2024-01-18 03:53 UTC
        let observation = MeeusEphemeris.observe(at("2024-01-18 03:53")).unwrap();
        assert!((observation.illumination_percent - 50.0).abs() < 3.0);
        assert_eq!(observation.phase(), MoonPhase::WaxingCrescent);
    }

    #[test]
    fn test_observation_validation() {
        assert!(LunarObservation::new(f64::NAN, 1.0).is_err());
        assert!(LunarObservation::new(50.0, -0.5).is_err());
        assert!(LunarObservation::new(50.0, f64::INFINITY).is_err());
        assert!(LunarObservation::new(50.0, 31.0).is_err());

        let clamped = LunarObservation::new(100.000001, 14.0).unwrap();
        assert_eq!(clamped.illumination_percent, 100.0);

        let clamped = LunarObservation::new(-0.000001, 0.0).unwrap();
        assert_eq!(clamped.illumination_percent, 0.0);
    }
}
