//! Engine configuration
//!
//! Settings are plain serde data so they can live in a JSON file next to the
//! question set. Missing fields fall back to their defaults.

use crate::balance::InsightThresholds;
use crate::cache::CachePolicy;
use crate::error::EngineError;
use crate::wing::TieBreak;
use serde::{Deserialize, Serialize};

/// Default maximum display-name length in characters
pub const DEFAULT_NAME_MAX_LENGTH: usize = 100;

/// Tunable engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Primary-type tie-break rule
    pub tie_break: TieBreak,
    /// Team report caching mode
    pub cache: CachePolicy,
    /// Display names are truncated to this many characters
    pub name_max_length: usize,
    /// Insight thresholds for team reports
    pub insights: InsightThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::default(),
            cache: CachePolicy::default(),
            name_max_length: DEFAULT_NAME_MAX_LENGTH,
            insights: InsightThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Development mode: caching disabled
    pub fn live() -> Self {
        Self {
            cache: CachePolicy::Live,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.name_max_length == 0 {
            return Err(EngineError::InvalidConfig(
                "name_max_length must be greater than zero".to_string(),
            ));
        }

        let thresholds = [
            ("insights.well_balanced", self.insights.well_balanced),
            ("insights.dominant_share", self.insights.dominant_share),
            ("insights.center_share", self.insights.center_share),
        ];
        for (name, value) in thresholds {
            if !(value > 0.0 && value <= 1.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.name_max_length, 100);
        assert_eq!(config.tie_break, TieBreak::LowestId);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json(
            r#"{"tie_break": "center", "cache": {"mode": "live"}, "insights": {"dominant_share": 0.4}}"#,
        )
        .unwrap();

        assert_eq!(config.tie_break, TieBreak::Center);
        assert_eq!(config.cache, CachePolicy::Live);
        assert_eq!(config.insights.dominant_share, 0.4);
        assert_eq!(config.insights.center_share, 0.6);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"name_max_length": 0}"#),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"insights": {"well_balanced": 1.5}}"#),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_roundtrip() {
        let config = EngineConfig::live();
        let loaded = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }
}
