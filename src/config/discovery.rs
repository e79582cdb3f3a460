use super::traits::ConfigSection;
use crate::engines::preprocessing::{default_regime_ranges, RegimeRange};
use crate::error::DiscoveryError;
use crate::types::Feature;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub split_by_regime: bool,
    pub normalize_features: bool,
    /// Share of examples, oldest first, used for training.
    pub train_fraction: f64,
    /// Runs with fewer examples than this are skipped.
    pub min_examples: usize,
    pub parallel: bool,
    pub variables: Vec<String>,
    pub regime_ranges: Vec<RegimeRange>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            split_by_regime: true,
            normalize_features: true,
            train_fraction: 0.8,
            min_examples: 30,
            parallel: true,
            variables: Feature::all_names(),
            regime_ranges: default_regime_ranges(),
        }
    }
}

impl ConfigSection for DiscoveryConfig {
    fn section_name() -> &'static str {
        "discovery"
    }

    fn validate(&self) -> Result<(), DiscoveryError> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(DiscoveryError::Configuration(
                "Train fraction must be between 0 and 1".to_string()
            ));
        }
        if self.min_examples < 2 {
            return Err(DiscoveryError::Configuration(
                "Minimum examples must be at least 2".to_string()
            ));
        }
        if self.variables.is_empty() {
            return Err(DiscoveryError::Configuration(
                "At least one variable is required".to_string()
            ));
        }
        if let Some(unknown) = self.variables.iter().find(|v| Feature::from_name(v).is_none()) {
            return Err(DiscoveryError::Configuration(format!(
                "Unknown variable: {}",
                unknown
            )));
        }
        if self.split_by_regime {
            if self.regime_ranges.is_empty() {
                return Err(DiscoveryError::Configuration(
                    "Regime split requires at least one range".to_string()
                ));
            }
            for range in &self.regime_ranges {
                if !(range.min < range.max) {
                    return Err(DiscoveryError::Configuration(format!(
                        "Regime range '{}' has min >= max",
                        range.name
                    )));
                }
            }
            for pair in self.regime_ranges.windows(2) {
                if pair[1].min < pair[0].max {
                    return Err(DiscoveryError::Configuration(format!(
                        "Regime ranges '{}' and '{}' overlap or are out of order",
                        pair[0].name, pair[1].name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DiscoveryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_nan_train_fraction() {
        let config = DiscoveryConfig {
            train_fraction: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DiscoveryError::Configuration(_))));
    }

    #[test]
    fn test_rejects_unknown_variable() {
        let config = DiscoveryConfig {
            variables: vec!["cagr".to_string(), "stability".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_overlapping_ranges() {
        let config = DiscoveryConfig {
            regime_ranges: vec![
                RegimeRange::new(-1.0, 0.2, "low"),
                RegimeRange::new(0.0, 1.0, "high"),
            ],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
