//! Measurement parsing
//!
//! Caller input arrives as strings or JSON numbers. Values are parsed once into
//! a tagged [`MeasurementValue`]; downstream stages only ever see finite numbers.

use crate::error::{EngineError, MissingField, Side};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static MISSING: MeasurementValue = MeasurementValue::Missing;

/// A single parsed input cell
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementValue {
    Present(f64),
    Missing,
    /// Present but not a finite number; keeps the raw text for error reporting
    NonNumeric(String),
}

impl MeasurementValue {
    /// Parse user-entered text. Blank input is `Missing`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return MeasurementValue::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => MeasurementValue::Present(v),
            _ => MeasurementValue::NonNumeric(trimmed.to_string()),
        }
    }

    pub fn from_number(v: f64) -> Self {
        if v.is_finite() {
            MeasurementValue::Present(v)
        } else {
            MeasurementValue::NonNumeric(v.to_string())
        }
    }

    /// Map a JSON value: numbers and numeric strings are accepted, null is missing
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => MeasurementValue::Missing,
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(v) => Self::from_number(v),
                None => MeasurementValue::NonNumeric(n.to_string()),
            },
            serde_json::Value::String(s) => Self::parse(s),
            other => MeasurementValue::NonNumeric(other.to_string()),
        }
    }

    /// The numeric value, if usable
    pub fn value(&self) -> Option<f64> {
        match self {
            MeasurementValue::Present(v) => Some(*v),
            _ => None,
        }
    }

    /// Back to JSON; non-numeric text is kept as a string
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MeasurementValue::Present(v) => serde_json::Value::from(*v),
            MeasurementValue::Missing => serde_json::Value::Null,
            MeasurementValue::NonNumeric(raw) => serde_json::Value::String(raw.clone()),
        }
    }

    /// Strict accessor for a named biomarker on one side
    pub fn require(&self, biomarker: &str, side: Side) -> Result<f64, EngineError> {
        match self {
            MeasurementValue::Present(v) => Ok(*v),
            MeasurementValue::Missing => Err(EngineError::IncompleteInput {
                missing: vec![MissingField {
                    biomarker: biomarker.to_string(),
                    side,
                    raw: None,
                }],
            }),
            MeasurementValue::NonNumeric(raw) => Err(EngineError::NonNumericInput {
                biomarker: biomarker.to_string(),
                raw: raw.clone(),
            }),
        }
    }
}

/// One set of measurements (baseline or retest), keyed by biomarker name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, serde_json::Value>",
    into = "BTreeMap<String, serde_json::Value>"
)]
pub struct MeasurementSet {
    values: BTreeMap<String, MeasurementValue>,
}

impl From<MeasurementSet> for BTreeMap<String, serde_json::Value> {
    fn from(set: MeasurementSet) -> Self {
        set.values
            .into_iter()
            .map(|(name, value)| {
                let json = value.to_json();
                (name, json)
            })
            .collect()
    }
}

impl From<BTreeMap<String, serde_json::Value>> for MeasurementSet {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let values = raw
            .into_iter()
            .map(|(name, value)| {
                let parsed = MeasurementValue::from_json(&value);
                (name, parsed)
            })
            .collect();
        Self { values }
    }
}

impl MeasurementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of name → number | string | null
    ///
    /// A numeric literal outside the `f64` range (`1e400`) is rejected by the
    /// JSON parser and fails the whole set with `JsonError`. The same text sent
    /// as a string becomes a `NonNumeric` cell and is reported per field.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build from numeric values
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(name, v)| (name.into(), MeasurementValue::from_number(v)))
            .collect();
        Self { values }
    }

    /// Record user-entered text for a biomarker, replacing any prior entry
    pub fn set_raw(&mut self, name: impl Into<String>, raw: &str) {
        self.values.insert(name.into(), MeasurementValue::parse(raw));
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: f64) {
        self.values
            .insert(name.into(), MeasurementValue::from_number(value));
    }

    pub fn remove(&mut self, name: &str) -> Option<MeasurementValue> {
        self.values.remove(name)
    }

    /// The entry for a biomarker; unknown names read as `Missing`
    pub fn get(&self, name: &str) -> &MeasurementValue {
        self.values.get(name).unwrap_or(&MISSING)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).value()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
