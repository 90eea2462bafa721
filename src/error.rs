//! Error types for the biomarker progress engine

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which measurement set a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Baseline,
    Retest,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Baseline => "baseline",
            Side::Retest => "retest",
        }
    }
}

/// A required value that was absent or unparseable at evaluation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingField {
    pub biomarker: String,
    pub side: Side,
    /// Raw text when the value was present but not a number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => write!(f, "{} ({}: {:?} is not a number)", self.biomarker, self.side.as_str(), raw),
            None => write!(f, "{} ({})", self.biomarker, self.side.as_str()),
        }
    }
}

/// Errors that can occur while building a registry or evaluating measurements
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown biomarker: {0}")]
    UnknownBiomarker(String),

    #[error("A baseline or retest value is missing: {}", join_fields(.missing))]
    IncompleteInput { missing: Vec<MissingField> },

    #[error("Value for {biomarker} is not a number: {raw:?}")]
    NonNumericInput { biomarker: String, raw: String },

    #[error("Invalid biomarker definition: {0}")]
    InvalidDefinition(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl EngineError {
    /// Fields named by an `IncompleteInput` error, empty for other kinds
    pub fn missing_fields(&self) -> &[MissingField] {
        match self {
            EngineError::IncompleteInput { missing } => missing,
            _ => &[],
        }
    }
}

fn join_fields(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
