use crate::types::{Feature, TrainingExample, TrainingInputs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Widening applied to a feature whose observed min equals its max.
pub const DEGENERATE_RANGE_PADDING: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    /// Range used for a feature never observed in the data.
    pub const UNIT: FeatureRange = FeatureRange { min: 0.0, max: 1.0 };
}

/// Min-max scaler fitted on a set of examples.
///
/// The regime score is never scaled. Absent optional metrics stay absent
/// after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureNormalizer {
    ranges: BTreeMap<Feature, FeatureRange>,
}

impl FeatureNormalizer {
    pub fn fit(examples: &[TrainingExample]) -> Self {
        let mut observed: BTreeMap<Feature, FeatureRange> = BTreeMap::new();

        for example in examples {
            for feature in Feature::ALL.iter().copied().filter(|f| f.is_normalized()) {
                let Some(value) = example.inputs.get(feature) else {
                    continue;
                };
                if !value.is_finite() {
                    continue;
                }
                observed
                    .entry(feature)
                    .and_modify(|range| {
                        range.min = range.min.min(value);
                        range.max = range.max.max(value);
                    })
                    .or_insert(FeatureRange { min: value, max: value });
            }
        }

        let ranges = Feature::ALL
            .iter()
            .copied()
            .filter(|f| f.is_normalized())
            .map(|feature| {
                let mut range = observed.get(&feature).copied().unwrap_or(FeatureRange::UNIT);
                if range.min == range.max {
                    range.max += DEGENERATE_RANGE_PADDING;
                }
                (feature, range)
            })
            .collect();

        Self { ranges }
    }

    pub fn range(&self, feature: Feature) -> Option<FeatureRange> {
        self.ranges.get(&feature).copied()
    }

    /// Scales `value` into [0, 1]. Features without a fitted range pass through.
    pub fn normalize_value(&self, value: f64, feature: Feature) -> f64 {
        match self.ranges.get(&feature) {
            Some(range) => ((value - range.min) / (range.max - range.min)).clamp(0.0, 1.0),
            None => value,
        }
    }

    pub fn normalize_inputs(&self, inputs: &TrainingInputs) -> TrainingInputs {
        let mut normalized = inputs.clone();
        for feature in Feature::ALL.iter().copied().filter(|f| f.is_normalized()) {
            let value = inputs.get(feature).map(|v| self.normalize_value(v, feature));
            normalized.set(feature, value);
        }
        normalized
    }

    pub fn apply(&self, examples: &[TrainingExample]) -> Vec<TrainingExample> {
        examples
            .iter()
            .map(|example| TrainingExample {
                inputs: self.normalize_inputs(&example.inputs),
                ..example.clone()
            })
            .collect()
    }
}

/// Fits a normalizer on `examples` and returns the scaled copies.
pub fn normalize_features(examples: &[TrainingExample]) -> Vec<TrainingExample> {
    FeatureNormalizer::fit(examples).apply(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn example(cagr: f64, volatility: f64, regime: f64, sharpe: Option<f64>) -> TrainingExample {
        let date = NaiveDate::from_ymd_opt(2022, 12, 30).unwrap();
        TrainingExample {
            symbol: "XYZ".to_string(),
            as_of: date,
            target_date: date,
            inputs: TrainingInputs {
                cagr,
                volatility,
                regime_score: regime,
                sharpe,
                ..Default::default()
            },
            target_return: 0.0,
        }
    }

    #[test]
    fn test_scales_to_unit_interval() {
        let examples = vec![
            example(0.0, 0.2, -0.8, Some(1.0)),
            example(0.1, 0.2, 0.4, None),
            example(0.2, 0.2, 0.9, Some(3.0)),
        ];
        let normalized = normalize_features(&examples);

        assert_eq!(normalized[0].inputs.cagr, 0.0);
        assert!((normalized[1].inputs.cagr - 0.5).abs() < 1e-12);
        assert_eq!(normalized[2].inputs.cagr, 1.0);

        // regime untouched
        assert_eq!(normalized[0].inputs.regime_score, -0.8);
        assert_eq!(normalized[2].inputs.regime_score, 0.9);

        // absent optional metric stays absent
        assert_eq!(normalized[1].inputs.sharpe, None);
        assert_eq!(normalized[2].inputs.sharpe, Some(1.0));
    }

    #[test]
    fn test_constant_feature_is_widened() {
        let examples = vec![example(0.1, 0.2, 0.0, None), example(0.3, 0.2, 0.0, None)];
        let normalizer = FeatureNormalizer::fit(&examples);
        let range = normalizer.range(Feature::Volatility).unwrap();
        assert_eq!(range.min, 0.2);
        assert!((range.max - 0.201).abs() < 1e-12);
        assert_eq!(normalizer.normalize_value(0.2, Feature::Volatility), 0.0);
    }

    #[test]
    fn test_unobserved_feature_defaults_to_unit_range() {
        let examples = vec![example(0.1, 0.2, 0.0, None)];
        let normalizer = FeatureNormalizer::fit(&examples);
        assert_eq!(normalizer.range(Feature::Sharpe), Some(FeatureRange::UNIT));
        assert_eq!(normalizer.range(Feature::Regime), None);
    }

    #[test]
    fn test_non_finite_values_ignored_and_output_clamped() {
        let examples = vec![
            example(f64::NAN, 0.1, 0.0, None),
            example(f64::INFINITY, 0.1, 0.0, None),
            example(0.5, 0.1, 0.0, None),
            example(1.5, 0.1, 0.0, None),
        ];
        let normalizer = FeatureNormalizer::fit(&examples);
        assert_eq!(
            normalizer.range(Feature::Cagr),
            Some(FeatureRange { min: 0.5, max: 1.5 })
        );
        assert_eq!(normalizer.normalize_value(3.0, Feature::Cagr), 1.0);
        assert_eq!(normalizer.normalize_value(-3.0, Feature::Cagr), 0.0);
    }
}
