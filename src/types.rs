//! Core types for the biomarker progress engine
//!
//! This module defines the data structures that flow through each stage of an
//! evaluation: biomarker definitions, classification and progress results, and
//! the final report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which direction of movement counts as improvement for a biomarker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directionality {
    Higher,
    Lower,
}

impl Directionality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Directionality::Higher => "higher",
            Directionality::Lower => "lower",
        }
    }
}

/// Static definition of a biomarker and its optimal range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerDefinition {
    /// Unique display name, used as the lookup key
    pub name: String,
    /// Measurement unit (display only, no conversion is performed)
    pub unit: String,
    /// Lower bound of the optimal range (inclusive)
    pub optimal_low: f64,
    /// Upper bound of the optimal range (inclusive)
    pub optimal_high: f64,
    /// Preferred direction of change
    #[serde(alias = "better")]
    pub directionality: Directionality,
}

impl BiomarkerDefinition {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        optimal_low: f64,
        optimal_high: f64,
        directionality: Directionality,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            optimal_low,
            optimal_high,
            directionality,
        }
    }

    /// Width of the optimal range
    pub fn range(&self) -> f64 {
        self.optimal_high - self.optimal_low
    }

    /// Midpoint of the optimal range
    pub fn midpoint(&self) -> f64 {
        self.optimal_low + self.range() / 2.0
    }
}

/// Qualitative label for a single value relative to the optimal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationLabel {
    Optimal,
    /// Past the cutoff on the worse side of the range
    Deficient,
    /// Past the cutoff on the better side of the range
    Elevated,
    NeedsSupport,
    /// No usable value
    Empty,
}

impl ClassificationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::Optimal => "Optimal",
            ClassificationLabel::Deficient => "Deficient",
            ClassificationLabel::Elevated => "Elevated",
            ClassificationLabel::NeedsSupport => "Needs Support",
            ClassificationLabel::Empty => "",
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            ClassificationLabel::Empty => Tier::None,
            ClassificationLabel::Optimal => Tier::Good,
            ClassificationLabel::NeedsSupport => Tier::Caution,
            ClassificationLabel::Deficient | ClassificationLabel::Elevated => Tier::Alert,
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal severity of a classification, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    None,
    Good,
    Caution,
    Alert,
}

/// Classification of a single value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: ClassificationLabel,
    pub tier: Tier,
}

impl From<ClassificationLabel> for ClassificationResult {
    fn from(label: ClassificationLabel) -> Self {
        Self {
            label,
            tier: label.tier(),
        }
    }
}

/// Progress bucket between a baseline and a retest value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NoChange,
    Improved,
    ImprovedSignificant,
    Worsened,
    WorsenedSignificant,
    Unknown,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NoChange => "No Change",
            ProgressStatus::Improved => "Improved",
            ProgressStatus::ImprovedSignificant => "Improved (Significant)",
            ProgressStatus::Worsened => "Worsened",
            ProgressStatus::WorsenedSignificant => "Worsened (Significant)",
            ProgressStatus::Unknown => "?",
        }
    }

    pub fn is_improved(&self) -> bool {
        matches!(
            self,
            ProgressStatus::Improved | ProgressStatus::ImprovedSignificant
        )
    }

    pub fn is_worsened(&self) -> bool {
        matches!(
            self,
            ProgressStatus::Worsened | ProgressStatus::WorsenedSignificant
        )
    }

    pub fn is_significant(&self) -> bool {
        matches!(
            self,
            ProgressStatus::ImprovedSignificant | ProgressStatus::WorsenedSignificant
        )
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw numeric movement from baseline to retest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Increased,
    Decreased,
    Unchanged,
}

impl Movement {
    pub fn of(base: f64, retest: f64) -> Self {
        if retest > base {
            Movement::Increased
        } else if retest < base {
            Movement::Decreased
        } else {
            Movement::Unchanged
        }
    }
}

/// Comparison of a baseline and a retest value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressResult {
    pub status: ProgressStatus,
    /// Raw movement, absent when either value is unusable
    pub direction: Option<Movement>,
    /// `|retest - base| / range`, absent when either value is unusable
    pub percent_change: Option<f64>,
}

impl ProgressResult {
    pub fn unknown() -> Self {
        Self {
            status: ProgressStatus::Unknown,
            direction: None,
            percent_change: None,
        }
    }
}

/// Evaluation of one biomarker row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerResult {
    pub name: String,
    pub unit: String,
    pub baseline: Option<f64>,
    pub retest: Option<f64>,
    /// Classification of the retest value
    pub classification: ClassificationResult,
    pub progress: ProgressResult,
}

/// Complete output of one Calculate action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Per-biomarker results in registry order
    pub results: Vec<BiomarkerResult>,
    pub improved_count: usize,
    pub worsened_count: usize,
    pub optimal_count: usize,
    pub total_count: usize,
    /// Net progress score (0-100)
    pub score: u8,
    /// Narrative lines, always two
    pub insights: Vec<String>,
}

impl EvaluationReport {
    /// Look up a biomarker's result by name
    pub fn result_for(&self, name: &str) -> Option<&BiomarkerResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Rows whose change crossed the significant threshold, in registry order
    pub fn significant_changes(&self) -> impl Iterator<Item = &BiomarkerResult> {
        self.results
            .iter()
            .filter(|r| r.progress.status.is_significant())
    }

    /// Headline shown above the insights
    pub fn score_text(&self) -> String {
        format!("Progress Score: {}%", self.score)
    }
}
