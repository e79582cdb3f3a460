// src/engines/metrics/validation.rs
use super::fitness::{
    mean_absolute_error, root_mean_squared_error, spearman_correlation, EvaluationSet,
};
use crate::engines::formula::BoundFormula;
use crate::types::TrainingExample;
use serde::{Deserialize, Serialize};

/// Goodness-of-fit of a formula on a set of examples, reported to the
/// storage layer alongside the formula text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub spearman: f64,
    pub r_squared: f64,
    pub sample_count: usize,
}

impl ValidationMetrics {
    pub fn empty() -> Self {
        Self {
            mae: 0.0,
            rmse: 0.0,
            spearman: 0.0,
            r_squared: 0.0,
            sample_count: 0,
        }
    }

    pub fn calculate(formula: &BoundFormula, examples: &[TrainingExample]) -> Self {
        let set = EvaluationSet::from_examples(examples);
        if set.is_empty() {
            return Self::empty();
        }

        let predicted: Vec<f64> = set
            .predict(formula)
            .into_iter()
            .map(|p| if p.is_finite() { p } else { 0.0 })
            .collect();
        let actual = set.targets();

        Self {
            mae: mean_absolute_error(&predicted, actual),
            rmse: root_mean_squared_error(&predicted, actual),
            spearman: spearman_correlation(&predicted, actual),
            r_squared: r_squared(&predicted, actual),
            sample_count: actual.len(),
        }
    }
}

fn r_squared(predicted: &[f64], actual: &[f64]) -> f64 {
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let total: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if total == 0.0 {
        return 0.0;
    }
    let residual: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (a - p).powi(2))
        .sum();
    1.0 - residual / total
}
