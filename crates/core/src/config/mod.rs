use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    geometry::GeometryConfig, smoothing::SmoothingConfig, transition::TransitionConfig,
    PhaseBoundaries, PhaseVisualTable, Result,
};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Configuration of the animation engine.
///
/// Boundaries and the visual table validate while deserialising, so a
/// loaded `EngineConfig` is always usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub boundaries: PhaseBoundaries,
    pub table: PhaseVisualTable,
    pub smoothing: SmoothingConfig,
    pub transition: TransitionConfig,
    pub geometry: GeometryConfig,
}

impl EngineConfig {
    pub fn new(boundaries: PhaseBoundaries, table: PhaseVisualTable) -> Self {
        Self {
            boundaries,
            table,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MandalaError, Phase};

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.engine.boundaries.start_of(Phase::Peak), Some(130.0));
        assert_eq!(config.engine.transition.duration_seconds, 1.5);
        assert_eq!(config.engine.geometry.outer_radius, 5.0);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config = AppConfig::from_json_str(
            r#"{"engine":{"smoothing":{"alpha_rate":4.0},"boundaries":[{"phase":"peak","start_seconds":3.0}]}}"#,
        )
        .unwrap();
        assert_eq!(config.engine.smoothing.alpha_rate, 4.0);
        assert_eq!(config.engine.smoothing.scale_rate, 2.0);
        assert_eq!(config.engine.boundaries.classify(3.5), Phase::Peak);
    }

    #[test]
    fn invalid_boundaries_fail_to_load() {
        let err = AppConfig::from_json_str(
            r#"{"engine":{"boundaries":[{"phase":"curiosity","start_seconds":9.0},{"phase":"peak","start_seconds":4.0}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MandalaError::Json(_)));
        assert!(err.to_string().contains("peak"));
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let json = AppConfig::default().to_json_pretty().unwrap();
        let parsed = AppConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.engine.table, PhaseVisualTable::default());
    }
}
