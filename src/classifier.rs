//! Value classification
//!
//! Places a single value into one of four bands around a biomarker's optimal
//! range:
//!
//! ```text
//!   deficient_cutoff      low ─── optimal ─── high      elevated_cutoff
//! ───────┼─────────────────┼───────────────────┼──────────────┼──────────
//!  severe  needs support         optimal        needs support   severe
//! ```
//!
//! The severe band below the range is `Deficient` when higher is better and
//! `Elevated` when lower is better; above the range it is the reverse.

use crate::types::{BiomarkerDefinition, ClassificationLabel, ClassificationResult, Directionality};

/// Fraction of the optimal range width between each bound and its cutoff
pub const CUTOFF_FRACTION: f64 = 0.25;

/// Position of a value relative to the optimal range and its cutoffs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    BelowCutoff,
    BelowRange,
    InRange,
    AboveRange,
    AboveCutoff,
}

impl Band {
    fn locate(def: &BiomarkerDefinition, value: f64) -> Self {
        let (low, high) = (def.optimal_low, def.optimal_high);
        let margin = CUTOFF_FRACTION * def.range();

        if value >= low && value <= high {
            Band::InRange
        } else if value < low - margin {
            Band::BelowCutoff
        } else if value > high + margin {
            Band::AboveCutoff
        } else if value < low {
            Band::BelowRange
        } else {
            Band::AboveRange
        }
    }
}

/// Classify a value against a biomarker's optimal range.
///
/// `None` or a non-finite value yields `Empty`.
pub fn classify(def: &BiomarkerDefinition, value: Option<f64>) -> ClassificationResult {
    let value = match value {
        Some(v) if v.is_finite() => v,
        _ => return ClassificationLabel::Empty.into(),
    };

    let label = match (Band::locate(def, value), def.directionality) {
        (Band::InRange, _) => ClassificationLabel::Optimal,
        (Band::BelowCutoff, Directionality::Higher) => ClassificationLabel::Deficient,
        (Band::AboveCutoff, Directionality::Lower) => ClassificationLabel::Deficient,
        (Band::AboveCutoff, Directionality::Higher) => ClassificationLabel::Elevated,
        (Band::BelowCutoff, Directionality::Lower) => ClassificationLabel::Elevated,
        (Band::BelowRange | Band::AboveRange, _) => ClassificationLabel::NeedsSupport,
    };

    label.into()
}
