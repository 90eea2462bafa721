//! Stateful input tracking
//!
//! [`ProgressTracker`] holds what a form-based caller edits: the baseline and
//! retest entries and the last successful report. The evaluation engine itself
//! stays stateless; the tracker only passes snapshots into it.

use crate::error::{EngineError, Side};
use crate::evaluator::Evaluator;
use crate::measurement::MeasurementSet;
use crate::registry::BiomarkerRegistry;
use crate::types::{BiomarkerResult, EvaluationReport};
use tracing::debug;

/// Editable baseline/retest entries plus the last good report.
pub struct ProgressTracker<'a> {
    evaluator: Evaluator<'a>,
    baseline: MeasurementSet,
    retest: MeasurementSet,
    report: Option<EvaluationReport>,
}

impl Default for ProgressTracker<'static> {
    fn default() -> Self {
        Self::new(BiomarkerRegistry::standard())
    }
}

impl<'a> ProgressTracker<'a> {
    pub fn new(registry: &'a BiomarkerRegistry) -> Self {
        Self {
            evaluator: Evaluator::new(registry),
            baseline: MeasurementSet::new(),
            retest: MeasurementSet::new(),
            report: None,
        }
    }

    /// Record user-entered text for one cell.
    ///
    /// Blank text clears the cell. Names outside the registry are rejected.
    pub fn set_input(&mut self, name: &str, side: Side, raw: &str) -> Result<(), EngineError> {
        self.evaluator.registry().definition_for(name)?;
        let set = match side {
            Side::Baseline => &mut self.baseline,
            Side::Retest => &mut self.retest,
        };
        if raw.trim().is_empty() {
            set.remove(name);
        } else {
            set.set_raw(name, raw);
        }
        Ok(())
    }

    pub fn baseline(&self) -> &MeasurementSet {
        &self.baseline
    }

    pub fn retest(&self) -> &MeasurementSet {
        &self.retest
    }

    /// Rows for the current, possibly incomplete, entries
    pub fn preview(&self) -> Result<Vec<BiomarkerResult>, EngineError> {
        self.evaluator.preview(&self.baseline, &self.retest)
    }

    /// Evaluate the current entries.
    ///
    /// On success the new report replaces the previous one. On failure the
    /// previous report is left untouched.
    pub fn calculate(&mut self) -> Result<&EvaluationReport, EngineError> {
        let report = self.evaluator.evaluate(&self.baseline, &self.retest)?;
        debug!(score = report.score, "tracker report replaced");
        Ok(&*self.report.insert(report))
    }

    /// The last successful report, if any
    pub fn report(&self) -> Option<&EvaluationReport> {
        self.report.as_ref()
    }

    /// Drop all entries and the last report
    pub fn reset(&mut self) {
        self.baseline = MeasurementSet::new();
        self.retest = MeasurementSet::new();
        self.report = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassificationLabel, ProgressStatus};

    fn fill(tracker: &mut ProgressTracker<'_>) {
        let defs = BiomarkerRegistry::standard().definitions();
        for d in defs {
            let mid = d.midpoint().to_string();
            tracker.set_input(&d.name, Side::Baseline, &mid).unwrap();
            tracker.set_input(&d.name, Side::Retest, &mid).unwrap();
        }
    }

    #[test]
    fn test_calculate_after_full_entry() {
        let mut tracker = ProgressTracker::default();
        fill(&mut tracker);

        let report = tracker.calculate().unwrap();
        assert_eq!(report.score, 50);
        assert_eq!(report.optimal_count, 9);
        assert!(tracker.report().is_some());
    }

    #[test]
    fn test_failed_calculate_keeps_prior_report() {
        let mut tracker = ProgressTracker::default();
        fill(&mut tracker);
        tracker.set_input("HbA1c", Side::Baseline, "5.4").unwrap();
        tracker.set_input("HbA1c", Side::Retest, "5.0").unwrap();
        let first = tracker.calculate().unwrap().clone();

        tracker.set_input("TSH", Side::Retest, "").unwrap();
        let err = tracker.calculate().unwrap_err();
        assert!(matches!(err, EngineError::IncompleteInput { .. }));
        assert_eq!(tracker.report(), Some(&first));
    }

    #[test]
    fn test_non_numeric_entry_blocks_calculate() {
        let mut tracker = ProgressTracker::default();
        fill(&mut tracker);
        tracker.set_input("SHBG", Side::Baseline, "n/a").unwrap();

        let err = tracker.calculate().unwrap_err();
        let missing = err.missing_fields();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].biomarker, "SHBG");
        assert_eq!(missing[0].raw.as_deref(), Some("n/a"));
        assert!(tracker.report().is_none());
    }

    #[test]
    fn test_unknown_name_rejected_on_entry() {
        let mut tracker = ProgressTracker::default();
        let err = tracker.set_input("Ferritin", Side::Baseline, "80").unwrap_err();
        assert!(matches!(err, EngineError::UnknownBiomarker(_)));
        assert!(tracker.baseline().is_empty());
    }

    #[test]
    fn test_preview_before_calculate() {
        let mut tracker = ProgressTracker::default();
        tracker.set_input("HbA1c", Side::Baseline, "5.4").unwrap();
        tracker.set_input("HbA1c", Side::Retest, "5.0").unwrap();

        let rows = tracker.preview().unwrap();
        let hba1c = rows.iter().find(|r| r.name == "HbA1c").unwrap();
        assert_eq!(hba1c.progress.status, ProgressStatus::ImprovedSignificant);
        assert_eq!(hba1c.classification.label, ClassificationLabel::Optimal);

        let tsh = rows.iter().find(|r| r.name == "TSH").unwrap();
        assert_eq!(tsh.classification.label, ClassificationLabel::Empty);
        assert_eq!(tsh.progress.status, ProgressStatus::Unknown);
        assert!(tracker.report().is_none());
    }

    #[test]
    fn test_reset() {
        let mut tracker = ProgressTracker::default();
        fill(&mut tracker);
        tracker.calculate().unwrap();
        tracker.reset();

        assert!(tracker.baseline().is_empty());
        assert!(tracker.retest().is_empty());
        assert!(tracker.report().is_none());
    }
}
