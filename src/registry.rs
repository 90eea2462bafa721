//! Biomarker registry
//!
//! The registry is the engine's configuration: an ordered, immutable table of
//! biomarker definitions. The order drives report and table ordering.

use crate::error::EngineError;
use crate::types::{BiomarkerDefinition, Directionality};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

/// Ordered, validated set of biomarker definitions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiomarkerRegistry {
    biomarkers: Vec<BiomarkerDefinition>,
}

/// On-disk registry format
#[derive(Debug, Deserialize)]
struct RegistryConfig {
    biomarkers: Vec<BiomarkerDefinition>,
}

impl BiomarkerRegistry {
    /// The standard nine-biomarker panel
    pub fn standard() -> &'static BiomarkerRegistry {
        static STANDARD: OnceLock<BiomarkerRegistry> = OnceLock::new();
        STANDARD.get_or_init(|| BiomarkerRegistry {
            biomarkers: standard_definitions(),
        })
    }

    /// Build a registry, rejecting malformed definitions
    pub fn from_definitions(biomarkers: Vec<BiomarkerDefinition>) -> Result<Self, EngineError> {
        if biomarkers.is_empty() {
            return Err(EngineError::InvalidDefinition(
                "registry must contain at least one biomarker".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for def in &biomarkers {
            if let Err(e) = validate_definition(def) {
                warn!(biomarker = %def.name, error = %e, "rejected biomarker definition");
                return Err(e);
            }
            if !seen.insert(def.name.as_str()) {
                return Err(EngineError::InvalidDefinition(format!(
                    "duplicate biomarker name: {}",
                    def.name
                )));
            }
        }

        Ok(Self { biomarkers })
    }

    /// Parse a registry from `{"biomarkers": [...]}` JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: RegistryConfig = serde_json::from_str(json)?;
        Self::from_definitions(config.biomarkers)
    }

    /// Load a registry from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Serialize in the same format `from_json` accepts
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(EngineError::JsonError)
    }

    pub fn definition_for(&self, name: &str) -> Result<&BiomarkerDefinition, EngineError> {
        self.biomarkers
            .iter()
            .find(|def| def.name == name)
            .ok_or_else(|| EngineError::UnknownBiomarker(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.biomarkers.iter().any(|def| def.name == name)
    }

    /// Biomarker names in registry order
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        self.biomarkers.iter().map(|def| def.name.as_str())
    }

    /// Definitions in registry order
    pub fn definitions(&self) -> &[BiomarkerDefinition] {
        &self.biomarkers
    }

    pub fn len(&self) -> usize {
        self.biomarkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biomarkers.is_empty()
    }
}

fn validate_definition(def: &BiomarkerDefinition) -> Result<(), EngineError> {
    if def.name.trim().is_empty() {
        return Err(EngineError::InvalidDefinition(
            "biomarker name must not be empty".to_string(),
        ));
    }
    if !def.optimal_low.is_finite() || !def.optimal_high.is_finite() {
        return Err(EngineError::InvalidDefinition(format!(
            "{}: optimal bounds must be finite",
            def.name
        )));
    }
    if def.optimal_low >= def.optimal_high {
        return Err(EngineError::InvalidDefinition(format!(
            "{}: optimal_low ({}) must be below optimal_high ({})",
            def.name, def.optimal_low, def.optimal_high
        )));
    }
    Ok(())
}

fn standard_definitions() -> Vec<BiomarkerDefinition> {
    use Directionality::{Higher, Lower};

    vec![
        BiomarkerDefinition::new("Testosterone (Free)", "ng/mL", 0.0006, 0.0045, Lower),
        BiomarkerDefinition::new("Testosterone (Total)", "ng/mL", 0.15, 0.5, Lower),
        BiomarkerDefinition::new("DHEA-S", "ug/dL", 35.0, 250.0, Lower),
        BiomarkerDefinition::new("SHBG", "nmol/L", 30.0, 100.0, Higher),
        BiomarkerDefinition::new("Cortisol (AM)", "ug/dL", 6.0, 15.0, Lower),
        BiomarkerDefinition::new("Insulin (Fasting)", "uIU/mL", 2.0, 7.0, Lower),
        BiomarkerDefinition::new("HbA1c", "%", 4.8, 5.4, Lower),
        BiomarkerDefinition::new("Vitamin D", "ng/mL", 30.0, 80.0, Higher),
        BiomarkerDefinition::new("TSH", "uIU/mL", 1.0, 2.5, Lower),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_standard_order() {
        let names: Vec<&str> = BiomarkerRegistry::standard().all_names().collect();
        assert_eq!(
            names,
            vec![
                "Testosterone (Free)",
                "Testosterone (Total)",
                "DHEA-S",
                "SHBG",
                "Cortisol (AM)",
                "Insulin (Fasting)",
                "HbA1c",
                "Vitamin D",
                "TSH",
            ]
        );
    }

    #[test]
    fn test_standard_passes_validation() {
        let standard = BiomarkerRegistry::standard();
        let rebuilt = BiomarkerRegistry::from_definitions(standard.definitions().to_vec()).unwrap();
        assert_eq!(&rebuilt, standard);
    }

    #[test]
    fn test_definition_lookup() {
        let registry = BiomarkerRegistry::standard();
        let hba1c = registry.definition_for("HbA1c").unwrap();
        assert_eq!(hba1c.unit, "%");
        assert_eq!(hba1c.directionality, Directionality::Lower);

        let err = registry.definition_for("Ferritin").unwrap_err();
        assert!(matches!(err, EngineError::UnknownBiomarker(name) if name == "Ferritin"));
    }

    #[test]
    fn test_rejects_zero_width_range() {
        let result = BiomarkerRegistry::from_definitions(vec![BiomarkerDefinition::new(
            "Flat",
            "u",
            5.0,
            5.0,
            Directionality::Higher,
        )]);
        assert!(matches!(result, Err(EngineError::InvalidDefinition(_))));
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        let def = BiomarkerDefinition::new("TSH", "uIU/mL", 1.0, 2.5, Directionality::Lower);
        let result = BiomarkerRegistry::from_definitions(vec![def.clone(), def]);
        assert!(matches!(result, Err(EngineError::InvalidDefinition(_))));

        let result = BiomarkerRegistry::from_definitions(Vec::new());
        assert!(matches!(result, Err(EngineError::InvalidDefinition(_))));
    }

    #[test]
    fn test_rejects_non_finite_bounds() {
        let result = BiomarkerRegistry::from_definitions(vec![BiomarkerDefinition::new(
            "Odd",
            "u",
            f64::NEG_INFINITY,
            1.0,
            Directionality::Lower,
        )]);
        assert!(matches!(result, Err(EngineError::InvalidDefinition(_))));
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let json = BiomarkerRegistry::standard().to_json().unwrap();
        let parsed = BiomarkerRegistry::from_json(&json).unwrap();
        assert_eq!(&parsed, BiomarkerRegistry::standard());
    }

    #[test]
    fn test_from_json_custom_panel() {
        let registry = BiomarkerRegistry::from_json(
            r#"{
                "biomarkers": [
                    { "name": "Ferritin", "unit": "ng/mL", "optimal_low": 50, "optimal_high": 150, "directionality": "higher" },
                    { "name": "hs-CRP", "unit": "mg/L", "optimal_low": 0, "optimal_high": 1, "better": "lower" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("hs-CRP"));
        assert!(!registry.contains("HbA1c"));
    }

    #[test]
    fn test_from_file_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let err = BiomarkerRegistry::from_file(&path).unwrap_err();
        match err {
            EngineError::ConfigError(msg) => assert!(msg.contains("absent.json")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn test_from_file_reloads_saved_registry() {
        let mut file = NamedTempFile::new().unwrap();
        let json = BiomarkerRegistry::standard().to_json().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file.flush().unwrap();

        let loaded = BiomarkerRegistry::from_file(file.path()).unwrap();
        assert_eq!(&loaded, BiomarkerRegistry::standard());
    }

    #[test]
    fn test_from_file_bad_contents() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{\"biomarkers\": []}").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            BiomarkerRegistry::from_file(file.path()),
            Err(EngineError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            BiomarkerRegistry::from_json("not json"),
            Err(EngineError::JsonError(_))
        ));
    }
}
