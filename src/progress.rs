//! Progress comparison between a baseline and a retest value

use crate::types::{BiomarkerDefinition, Directionality, Movement, ProgressResult, ProgressStatus};

/// Changes smaller than this fraction of the optimal range count as no change
pub const NO_CHANGE_THRESHOLD: f64 = 0.10;

/// Changes larger than this fraction of the optimal range are significant
pub const SIGNIFICANT_THRESHOLD: f64 = 0.25;

/// Compare a baseline and a retest value for one biomarker.
///
/// Magnitude is measured relative to the width of the optimal range, so the
/// same buckets apply across biomarkers with very different units.
pub fn compare(def: &BiomarkerDefinition, base: Option<f64>, retest: Option<f64>) -> ProgressResult {
    let (base, retest) = match (base, retest) {
        (Some(b), Some(r)) if b.is_finite() && r.is_finite() => (b, r),
        _ => return ProgressResult::unknown(),
    };

    let percent_change = (retest - base).abs() / def.range();
    let movement = Movement::of(base, retest);
    let significant = percent_change > SIGNIFICANT_THRESHOLD;

    let status = if percent_change < NO_CHANGE_THRESHOLD {
        ProgressStatus::NoChange
    } else {
        match (def.directionality, movement) {
            (_, Movement::Unchanged) => ProgressStatus::NoChange,
            (Directionality::Higher, Movement::Increased)
            | (Directionality::Lower, Movement::Decreased) => {
                if significant {
                    ProgressStatus::ImprovedSignificant
                } else {
                    ProgressStatus::Improved
                }
            }
            (Directionality::Higher, Movement::Decreased)
            | (Directionality::Lower, Movement::Increased) => {
                if significant {
                    ProgressStatus::WorsenedSignificant
                } else {
                    ProgressStatus::Worsened
                }
            }
        }
    };

    ProgressResult {
        status,
        direction: Some(movement),
        percent_change: Some(percent_change),
    }
}
