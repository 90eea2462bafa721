//! Narrative insight generation
//!
//! Two independent decision tables, evaluated top to bottom, each select one
//! line: one about net progress and one about how many values are optimal.

use serde::{Deserialize, Serialize};

/// Category of the progress line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressInsight {
    AllImproved,
    AllWorsened,
    MoreImproved,
    MoreWorsened,
    Mixed,
}

/// Category of the optimal-achievement line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimalInsight {
    AllOptimal,
    MostOptimal,
    SomeOptimal,
    NoneOptimal,
}

impl ProgressInsight {
    pub fn select(improved: usize, worsened: usize, total: usize) -> Self {
        if improved == total {
            ProgressInsight::AllImproved
        } else if worsened == total {
            ProgressInsight::AllWorsened
        } else if improved > worsened {
            ProgressInsight::MoreImproved
        } else if worsened > improved {
            ProgressInsight::MoreWorsened
        } else {
            ProgressInsight::Mixed
        }
    }

    pub fn render(&self, improved: usize, worsened: usize, total: usize) -> String {
        match self {
            ProgressInsight::AllImproved => format!(
                "Amazing job! All {total} biomarkers improved since your last check. Your hard work is paying off!"
            ),
            ProgressInsight::AllWorsened => "It looks like all biomarkers shifted the wrong way this time. Don't worry, progress can take time and small consistent steps will help!".to_string(),
            ProgressInsight::MoreImproved => format!(
                "Nice progress! {improved} biomarkers improved while {worsened} had a setback. Keep building on these positive changes!"
            ),
            ProgressInsight::MoreWorsened => format!(
                "A few biomarkers worsened ({worsened}) compared to {improved} improvement(s). This shows progress in certain areas. However, focus on adjusting habits for the others and you can keep moving forward!"
            ),
            ProgressInsight::Mixed => format!(
                "Mixed changes this time: {improved} improved and {worsened} worsened. It is a steady pace, keep going and focus on what you can improve next!"
            ),
        }
    }
}

impl OptimalInsight {
    pub fn select(optimal: usize, total: usize) -> Self {
        if optimal == total {
            OptimalInsight::AllOptimal
        } else if 2 * optimal >= total {
            OptimalInsight::MostOptimal
        } else if optimal > 0 {
            OptimalInsight::SomeOptimal
        } else {
            OptimalInsight::NoneOptimal
        }
    }

    pub fn render(&self, optimal: usize, total: usize) -> String {
        match self {
            OptimalInsight::AllOptimal => format!(
                "Fantastic! All {total} biomarkers are now in the optimal range. Keep up the great work maintaining this balance!"
            ),
            OptimalInsight::MostOptimal => format!(
                "Good job! {optimal} biomarkers are already in the optimal range. With a little more effort, you could get them all there!"
            ),
            OptimalInsight::SomeOptimal => format!(
                "You have got {optimal} biomarker(s) in the optimal range, which is a solid start! Focusing on the rest step by step will get you closer to your goals."
            ),
            OptimalInsight::NoneOptimal => "None of the biomarkers are in the optimal range yet, but don't worry! Small improvements add up over time, and you are on the right track by monitoring progress.".to_string(),
        }
    }
}

/// Produce the two narrative lines for a set of tallies.
pub fn generate_insights(
    improved: usize,
    worsened: usize,
    optimal: usize,
    total: usize,
) -> Vec<String> {
    vec![
        ProgressInsight::select(improved, worsened, total).render(improved, worsened, total),
        OptimalInsight::select(optimal, total).render(optimal, total),
    ]
}
