//! Fixed percentage-to-grade and percentage-to-band step tables.

use crate::model::{Band, Grade};

/// Inclusive lower bounds, highest grade first. Anything below is an F.
const GRADE_THRESHOLDS: [(u32, Grade); 12] = [
    (95, Grade::APlus),
    (90, Grade::A),
    (85, Grade::AMinus),
    (80, Grade::BPlus),
    (75, Grade::B),
    (70, Grade::BMinus),
    (65, Grade::CPlus),
    (60, Grade::C),
    (55, Grade::CMinus),
    (50, Grade::DPlus),
    (45, Grade::D),
    (40, Grade::DMinus),
];

/// Percentage at which the band ladder starts (band 0.5).
const BAND_FLOOR: u32 = 10;
/// Percentage points per half band.
const BAND_STEP: u32 = 5;

pub fn grade_for(percentage: u32) -> Grade {
    GRADE_THRESHOLDS
        .iter()
        .find(|(min, _)| percentage >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

/// Half-point band: 9.0 at 95% and above, down to 0.5 at 10%, else 0.0.
pub fn band_for(percentage: u32) -> Band {
    if percentage < BAND_FLOOR {
        return Band::from_half_points(0);
    }
    let steps = (percentage - BAND_FLOOR) / BAND_STEP + 1;
    Band::from_half_points(steps.min(u32::from(Band::MAX_HALF_POINTS)) as u8)
}

/// One-line overall assessment for a percentage.
pub fn assessment_for(percentage: u32) -> &'static str {
    match percentage {
        90.. => "Outstanding answer showing thorough, well-reasoned understanding.",
        75..=89 => "Strong answer covering most key concepts with good explanation.",
        60..=74 => "Sound answer that covers the core ideas but lacks depth in places.",
        40..=59 => "Partial answer with noticeable gaps in coverage or explanation.",
        1..=39 => "Limited answer that addresses few of the expected concepts.",
        0 => "The answer does not address the question.",
    }
}

/// `round(total / max * 100)`, clamped to `[0, 100]`.
pub fn percentage_of(total: u32, max_marks: u32) -> u32 {
    if max_marks == 0 {
        return 0;
    }
    let pct = (f64::from(total) / f64::from(max_marks) * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}
