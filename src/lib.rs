//! Biomarker Progress - evaluation engine for baseline/retest lab results
//!
//! The engine takes two sets of lab measurements (a baseline and a retest) and
//! runs a deterministic evaluation: measurement parsing → classification
//! against optimal ranges → progress comparison → scoring → narrative insights.
//!
//! ## Modules
//!
//! - **Registry**: the ordered table of biomarker definitions
//! - **Evaluator**: stateless evaluation of two measurement sets
//! - **Tracker**: caller-side state for form-style entry and recalculation

pub mod classifier;
pub mod encoder;
pub mod error;
pub mod evaluator;
pub mod insights;
pub mod measurement;
pub mod progress;
pub mod registry;
pub mod tracker;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use classifier::classify;
pub use error::{EngineError, MissingField, Side};
pub use evaluator::{evaluate, evaluate_json, preview_json, progress_score, Evaluator};
pub use insights::{generate_insights, OptimalInsight, ProgressInsight};
pub use measurement::{MeasurementSet, MeasurementValue};
pub use progress::compare;
pub use registry::BiomarkerRegistry;
pub use tracker::ProgressTracker;
pub use types::{
    BiomarkerDefinition, BiomarkerResult, ClassificationLabel, ClassificationResult,
    Directionality, EvaluationReport, Movement, ProgressResult, ProgressStatus, Tier,
};

/// Engine version embedded in all encoded reports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for encoded reports
pub const PRODUCER_NAME: &str = "biomarker-progress";
