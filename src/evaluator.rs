//! Evaluation orchestration
//!
//! This module provides the public entry points of the engine. It runs the
//! classifier and progress comparator over every biomarker in a registry,
//! tallies the results, scores them and attaches narrative insights.

use crate::classifier::classify;
use crate::encoder::ReportEncoder;
use crate::error::{EngineError, MissingField, Side};
use crate::insights::generate_insights;
use crate::measurement::{MeasurementSet, MeasurementValue};
use crate::progress::compare;
use crate::registry::BiomarkerRegistry;
use crate::types::{BiomarkerResult, ClassificationLabel, EvaluationReport};
use tracing::{debug, warn};

/// Evaluate two measurement sets against the standard registry.
///
/// # Example
/// ```ignore
/// let baseline = MeasurementSet::from_json(r#"{"HbA1c": 5.4, ...}"#)?;
/// let retest = MeasurementSet::from_json(r#"{"HbA1c": 5.0, ...}"#)?;
/// let report = evaluate(&baseline, &retest)?;
/// println!("{}", report.score_text());
/// ```
pub fn evaluate(
    baseline: &MeasurementSet,
    retest: &MeasurementSet,
) -> Result<EvaluationReport, EngineError> {
    Evaluator::default().evaluate(baseline, retest)
}

/// Evaluate two JSON measurement objects and return the encoded report JSON.
///
/// # Arguments
/// * `baseline_json` - Object of biomarker name → number | string | null
/// * `retest_json` - Same shape as `baseline_json`
pub fn evaluate_json(baseline_json: &str, retest_json: &str) -> Result<String, EngineError> {
    let baseline = MeasurementSet::from_json(baseline_json)?;
    let retest = MeasurementSet::from_json(retest_json)?;
    let report = evaluate(&baseline, &retest)?;
    ReportEncoder::new().encode_to_json(&report)
}

/// Preview rows for two JSON measurement objects, as a JSON array.
pub fn preview_json(baseline_json: &str, retest_json: &str) -> Result<String, EngineError> {
    let baseline = MeasurementSet::from_json(baseline_json)?;
    let retest = MeasurementSet::from_json(retest_json)?;
    let rows = Evaluator::default().preview(&baseline, &retest)?;
    Ok(serde_json::to_string(&rows)?)
}

/// Net progress score in 0-100.
///
/// `round((improved - worsened + total) / (2 * total) * 100)`, rounding halves
/// up. Zero improvement and zero worsening scores 50.
pub fn progress_score(improved: usize, worsened: usize, total: usize) -> u8 {
    if total == 0 {
        return 50;
    }
    let total = total as i64;
    let net = (improved as i64 - worsened as i64).clamp(-total, total);
    let score = ((net + total) * 100 + total) / (2 * total);
    score.clamp(0, 100) as u8
}

/// Stateless evaluator bound to a registry
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    registry: &'a BiomarkerRegistry,
}

impl Default for Evaluator<'static> {
    fn default() -> Self {
        Self::new(BiomarkerRegistry::standard())
    }
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a BiomarkerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a BiomarkerRegistry {
        self.registry
    }

    /// Run a full evaluation.
    ///
    /// Stages:
    /// 1. Reject names outside the registry
    /// 2. Require a usable value on both sides for every biomarker
    /// 3. Classify and compare each biomarker in registry order
    /// 4. Tally, score and generate insights
    pub fn evaluate(
        &self,
        baseline: &MeasurementSet,
        retest: &MeasurementSet,
    ) -> Result<EvaluationReport, EngineError> {
        self.check_names(baseline)?;
        self.check_names(retest)?;

        let missing = self.missing_fields(baseline, retest);
        if !missing.is_empty() {
            warn!(missing = missing.len(), "evaluation blocked by incomplete input");
            return Err(EngineError::IncompleteInput { missing });
        }

        let results = self.rows(baseline, retest);

        let improved_count = results.iter().filter(|r| r.progress.status.is_improved()).count();
        let worsened_count = results.iter().filter(|r| r.progress.status.is_worsened()).count();
        let optimal_count = results
            .iter()
            .filter(|r| r.classification.label == ClassificationLabel::Optimal)
            .count();
        let total_count = results.len();

        let score = progress_score(improved_count, worsened_count, total_count);
        let insights = generate_insights(improved_count, worsened_count, optimal_count, total_count);

        debug!(
            improved = improved_count,
            worsened = worsened_count,
            optimal = optimal_count,
            total = total_count,
            score,
            "evaluation complete"
        );

        Ok(EvaluationReport {
            results,
            improved_count,
            worsened_count,
            optimal_count,
            total_count,
            score,
            insights,
        })
    }

    /// Per-biomarker results for possibly incomplete input.
    ///
    /// Missing or non-numeric cells classify as `Empty` and compare as
    /// `Unknown`; only names outside the registry are an error.
    pub fn preview(
        &self,
        baseline: &MeasurementSet,
        retest: &MeasurementSet,
    ) -> Result<Vec<BiomarkerResult>, EngineError> {
        self.check_names(baseline)?;
        self.check_names(retest)?;
        Ok(self.rows(baseline, retest))
    }

    /// Every required field that is absent or non-numeric, baseline first per biomarker
    pub fn missing_fields(&self, baseline: &MeasurementSet, retest: &MeasurementSet) -> Vec<MissingField> {
        let mut missing = Vec::new();
        for name in self.registry.all_names() {
            for (side, set) in [(Side::Baseline, baseline), (Side::Retest, retest)] {
                let raw = match set.get(name) {
                    MeasurementValue::Present(_) => continue,
                    MeasurementValue::Missing => None,
                    MeasurementValue::NonNumeric(raw) => Some(raw.clone()),
                };
                missing.push(MissingField {
                    biomarker: name.to_string(),
                    side,
                    raw,
                });
            }
        }
        missing
    }

    fn check_names(&self, set: &MeasurementSet) -> Result<(), EngineError> {
        match set.names().find(|name| !self.registry.contains(name)) {
            Some(name) => Err(EngineError::UnknownBiomarker(name.to_string())),
            None => Ok(()),
        }
    }

    fn rows(&self, baseline: &MeasurementSet, retest: &MeasurementSet) -> Vec<BiomarkerResult> {
        self.registry
            .definitions()
            .iter()
            .map(|def| {
                let base_value = baseline.value(&def.name);
                let retest_value = retest.value(&def.name);
                BiomarkerResult {
                    name: def.name.clone(),
                    unit: def.unit.clone(),
                    baseline: base_value,
                    retest: retest_value,
                    classification: classify(def, retest_value),
                    progress: compare(def, base_value, retest_value),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{OptimalInsight, ProgressInsight};
    use crate::types::{Directionality, ProgressStatus};
    use pretty_assertions::assert_eq;

    fn midpoints() -> MeasurementSet {
        MeasurementSet::from_values(
            BiomarkerRegistry::standard()
                .definitions()
                .iter()
                .map(|d| (d.name.clone(), d.midpoint())),
        )
    }

    #[test]
    fn test_all_midpoints_unchanged() {
        let baseline = midpoints();
        let retest = midpoints();
        let report = evaluate(&baseline, &retest).unwrap();

        assert_eq!(report.improved_count, 0);
        assert_eq!(report.worsened_count, 0);
        assert_eq!(report.optimal_count, 9);
        assert_eq!(report.total_count, 9);
        assert_eq!(report.score, 50);
        assert_eq!(report.score_text(), "Progress Score: 50%");
        assert_eq!(report.insights.len(), 2);
        assert_eq!(report.insights[0], ProgressInsight::Mixed.render(0, 0, 9));
        assert_eq!(report.insights[1], OptimalInsight::AllOptimal.render(9, 9));
    }

    #[test]
    fn test_results_follow_registry_order() {
        let report = evaluate(&midpoints(), &midpoints()).unwrap();
        let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
        let expected: Vec<&str> = BiomarkerRegistry::standard().all_names().collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_hba1c_improvement_counted() {
        let mut baseline = midpoints();
        let mut retest = midpoints();
        baseline.set_value("HbA1c", 5.4);
        retest.set_value("HbA1c", 5.0);

        let report = evaluate(&baseline, &retest).unwrap();
        let hba1c = report.result_for("HbA1c").unwrap();
        assert_eq!(hba1c.progress.status, ProgressStatus::ImprovedSignificant);
        assert_eq!(hba1c.classification.label, ClassificationLabel::Optimal);
        assert_eq!(hba1c.unit, "%");

        assert_eq!(report.improved_count, 1);
        assert_eq!(report.worsened_count, 0);
        // round(10 / 18 * 100)
        assert_eq!(report.score, 56);
        assert_eq!(report.insights[0], ProgressInsight::MoreImproved.render(1, 0, 9));

        let significant: Vec<&str> = report.significant_changes().map(|r| r.name.as_str()).collect();
        assert_eq!(significant, vec!["HbA1c"]);
    }

    #[test]
    fn test_all_worsened() {
        let baseline = midpoints();
        let mut retest = MeasurementSet::new();
        for d in BiomarkerRegistry::standard().definitions() {
            // Move a full range width in the wrong direction
            let value = match d.directionality {
                Directionality::Higher => d.midpoint() - d.range(),
                Directionality::Lower => d.midpoint() + d.range(),
            };
            retest.set_value(d.name.clone(), value);
        }

        let report = evaluate(&baseline, &retest).unwrap();
        assert_eq!(report.worsened_count, 9);
        assert_eq!(report.optimal_count, 0);
        assert_eq!(report.score, 0);
        assert_eq!(report.insights[0], ProgressInsight::AllWorsened.render(0, 9, 9));
        assert_eq!(report.insights[1], OptimalInsight::NoneOptimal.render(0, 9));
    }

    #[test]
    fn test_one_missing_field_blocks_report() {
        let baseline = midpoints();
        let mut retest = midpoints();
        retest.remove("TSH");

        let err = evaluate(&baseline, &retest).unwrap_err();
        assert_eq!(
            err.missing_fields(),
            &[MissingField {
                biomarker: "TSH".to_string(),
                side: Side::Retest,
                raw: None,
            }]
        );
    }

    #[test]
    fn test_non_numeric_counts_as_missing() {
        let mut baseline = midpoints();
        baseline.set_raw("SHBG", "fifty");
        let mut retest = midpoints();
        retest.set_raw("SHBG", "");

        let err = evaluate(&baseline, &retest).unwrap_err();
        let missing = err.missing_fields();
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].side, Side::Baseline);
        assert_eq!(missing[0].raw.as_deref(), Some("fifty"));
        assert_eq!(missing[1].side, Side::Retest);
        assert_eq!(missing[1].raw, None);
    }

    #[test]
    fn test_unknown_name_rejected() {
        let mut baseline = midpoints();
        baseline.set_value("Ferritin", 80.0);
        let err = evaluate(&baseline, &midpoints()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownBiomarker(name) if name == "Ferritin"));
    }

    #[test]
    fn test_preview_tolerates_gaps() {
        let mut baseline = MeasurementSet::new();
        baseline.set_value("HbA1c", 5.4);
        let mut retest = MeasurementSet::new();
        retest.set_value("HbA1c", 5.0);
        retest.set_value("TSH", 2.0);

        let rows = Evaluator::default().preview(&baseline, &retest).unwrap();
        assert_eq!(rows.len(), 9);

        let hba1c = rows.iter().find(|r| r.name == "HbA1c").unwrap();
        assert_eq!(hba1c.progress.status, ProgressStatus::ImprovedSignificant);

        let tsh = rows.iter().find(|r| r.name == "TSH").unwrap();
        assert_eq!(tsh.classification.label, ClassificationLabel::Optimal);
        assert_eq!(tsh.progress.status, ProgressStatus::Unknown);

        let shbg = rows.iter().find(|r| r.name == "SHBG").unwrap();
        assert_eq!(shbg.classification.label, ClassificationLabel::Empty);
    }

    #[test]
    fn test_custom_registry() {
        let registry = BiomarkerRegistry::from_json(
            r#"{"biomarkers": [
                {"name": "Ferritin", "unit": "ng/mL", "optimal_low": 50, "optimal_high": 150, "directionality": "higher"}
            ]}"#,
        )
        .unwrap();
        let evaluator = Evaluator::new(&registry);

        let baseline = MeasurementSet::from_values([("Ferritin", 40.0)]);
        let retest = MeasurementSet::from_values([("Ferritin", 90.0)]);
        let report = evaluator.evaluate(&baseline, &retest).unwrap();

        assert_eq!(report.total_count, 1);
        assert_eq!(report.improved_count, 1);
        assert_eq!(report.score, 100);
        assert_eq!(report.insights[0], ProgressInsight::AllImproved.render(1, 0, 1));
    }

    #[test]
    fn test_score_bounds_and_monotonicity() {
        for total in 1..=12usize {
            let mut previous = 0u8;
            let mut first = true;
            // Walk net from -total to +total
            for net in -(total as i64)..=(total as i64) {
                let (improved, worsened) = if net >= 0 {
                    (net as usize, 0)
                } else {
                    (0, (-net) as usize)
                };
                let score = progress_score(improved, worsened, total);
                assert!(score <= 100);
                if !first {
                    assert!(score >= previous, "total {total}, net {net}");
                }
                previous = score;
                first = false;
            }
            assert_eq!(progress_score(0, total, total), 0);
            assert_eq!(progress_score(total, 0, total), 100);
        }
    }

    #[test]
    fn test_score_matches_float_rounding() {
        for total in 1..=12usize {
            for improved in 0..=total {
                for worsened in 0..=(total - improved) {
                    let expected = (((improved as f64 - worsened as f64 + total as f64)
                        / (2.0 * total as f64))
                        * 100.0)
                        .round() as u8;
                    assert_eq!(progress_score(improved, worsened, total), expected);
                }
            }
        }
    }

    #[test]
    fn test_evaluate_json() {
        let baseline = serde_json::to_string(&midpoints()).unwrap();
        let json = evaluate_json(&baseline, &baseline).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(payload["report"]["score"], 50);
        assert_eq!(payload["report"]["optimal_count"], 9);
        assert_eq!(payload["report"]["results"][6]["name"], "HbA1c");

        assert!(evaluate_json("not json", &baseline).is_err());
    }
}
