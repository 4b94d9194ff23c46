/// Moon phase classification
///
/// Maps the Moon's age (days since the preceding new moon) onto one of eight
/// named phases. The synodic month is split into eight buckets of equal width;
/// each bucket includes its lower bound and excludes its upper bound.
///
/// ```text
/// age  0 ........ 1/8 ........ 2/8 ... 7/8 ........ synodic month
///      | New Moon | Waxing Cr. | ...   | Waning Crescent |
/// ```
///
/// # Example
///
/// ```
/// use moonphase_shared::lunar::phase::{MoonPhase, SYNODIC_MONTH};
///
/// assert_eq!(MoonPhase::from_age(0.0), MoonPhase::NewMoon);
/// assert_eq!(MoonPhase::from_age(SYNODIC_MONTH * 0.5), MoonPhase::FullMoon);
/// assert_eq!(MoonPhase::from_age(SYNODIC_MONTH * 0.5).as_str(), "Full Moon");
/// ```

use serde::{Serialize, Serializer};
use std::fmt;

/// Mean length of a lunation in days
pub const SYNODIC_MONTH: f64 = 29.530588853;

/// Number of named phases the month is divided into
pub const PHASE_COUNT: usize = 8;

/// Named phase of the Moon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// All phases in lunation order
    pub const ALL: [MoonPhase; PHASE_COUNT] = [
        MoonPhase::NewMoon,
        MoonPhase::WaxingCrescent,
        MoonPhase::FirstQuarter,
        MoonPhase::WaxingGibbous,
        MoonPhase::FullMoon,
        MoonPhase::WaningGibbous,
        MoonPhase::LastQuarter,
        MoonPhase::WaningCrescent,
    ];

    /// Classifies a moon age in days
    ///
    /// Any finite non-negative age yields a phase. Ages at or beyond the last
    /// boundary, including values slightly past a full synodic month, fall into
    /// `WaningCrescent`. Callers are expected to reject negative or non-finite
    /// input before classifying.
    pub fn from_age(age_days: f64) -> Self {
        Self::ALL
            .iter()
            .take(PHASE_COUNT - 1)
            .enumerate()
            .find(|(index, _)| age_days < boundary(index + 1))
            .map(|(_, phase)| *phase)
            .unwrap_or(MoonPhase::WaningCrescent)
    }

    /// Position of this phase in lunation order (0 = new moon)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inclusive lower bound of this phase's bucket, in days
    pub fn lower_bound(self) -> f64 {
        boundary(self.index())
    }

    /// Display name of the phase
    pub fn as_str(self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::FullMoon => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        }
    }
}

/// Start of bucket `i`: `SYNODIC_MONTH * i / 8`
fn boundary(i: usize) -> f64 {
    SYNODIC_MONTH * i as f64 / PHASE_COUNT as f64
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MoonPhase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
