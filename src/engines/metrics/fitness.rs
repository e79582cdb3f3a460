// src/engines/metrics/fitness.rs
use crate::engines::formula::{BoundFormula, Node};
use crate::types::{TrainingExample, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// Fitness assigned when a formula cannot be scored. Lower is better, so
/// this loses every comparison.
pub const WORST_FITNESS: f64 = f64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessType {
    /// Mean absolute error.
    #[default]
    Mae,
    /// Root mean squared error.
    Rmse,
    /// 1 - Spearman rank correlation.
    Spearman,
}

/// Training examples flattened into feature vectors and targets once, so a
/// population can be scored without re-reading `TrainingInputs`.
#[derive(Debug, Clone, Default)]
pub struct EvaluationSet {
    features: Vec<[f64; FEATURE_COUNT]>,
    targets: Vec<f64>,
}

impl EvaluationSet {
    pub fn from_examples(examples: &[TrainingExample]) -> Self {
        Self {
            features: examples.iter().map(|e| e.inputs.to_vector()).collect(),
            targets: examples.iter().map(|e| e.target_return).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn predict(&self, formula: &BoundFormula) -> Vec<f64> {
        self.features.iter().map(|f| formula.evaluate(f)).collect()
    }

    pub fn fitness(&self, formula: &BoundFormula, fitness_type: FitnessType) -> f64 {
        if self.is_empty() {
            return WORST_FITNESS;
        }
        score_predictions(&self.predict(formula), &self.targets, fitness_type)
    }
}

/// Raw fitness of a formula over a set of examples (lower is better).
pub fn calculate_fitness(
    formula: &Node,
    examples: &[TrainingExample],
    fitness_type: FitnessType,
) -> f64 {
    if examples.is_empty() {
        return WORST_FITNESS;
    }
    let bound = BoundFormula::bind_lenient(formula);
    EvaluationSet::from_examples(examples).fitness(&bound, fitness_type)
}

/// Scores predictions against actual values. Non-finite results map to
/// `WORST_FITNESS` so populations always sort totally.
pub fn score_predictions(predicted: &[f64], actual: &[f64], fitness_type: FitnessType) -> f64 {
    if predicted.is_empty() || predicted.len() != actual.len() {
        return WORST_FITNESS;
    }
    // A single non-finite prediction disqualifies the formula under every metric
    if predicted.iter().any(|p| !p.is_finite()) {
        return WORST_FITNESS;
    }

    let score = match fitness_type {
        FitnessType::Mae => mean_absolute_error(predicted, actual),
        FitnessType::Rmse => root_mean_squared_error(predicted, actual),
        FitnessType::Spearman => 1.0 - spearman_correlation(predicted, actual),
    };

    if score.is_finite() {
        score
    } else {
        WORST_FITNESS
    }
}

pub fn calculate_complexity(formula: &Node) -> usize {
    formula.node_count()
}

/// Selection fitness: raw fitness plus an additive size penalty.
pub fn adjusted_fitness(raw_fitness: f64, complexity: usize, complexity_weight: f64) -> f64 {
    raw_fitness + complexity_weight * complexity as f64
}

pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> f64 {
    let sum: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum();
    sum / predicted.len() as f64
}

pub fn root_mean_squared_error(predicted: &[f64], actual: &[f64]) -> f64 {
    let sum: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    (sum / predicted.len() as f64).sqrt()
}

/// Spearman rank correlation. Returns 0.0 when either side has no variance
/// or fewer than two samples.
pub fn spearman_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 || x.len() != y.len() {
        return 0.0;
    }
    pearson_correlation(&ranks(x), &ranks(y))
}

pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    if x.is_empty() {
        return 0.0;
    }
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    covariance / (var_x.sqrt() * var_y.sqrt())
}

/// 1-based ranks; tied values share the average of the ranks they span.
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut result = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // positions i..=j hold ranks i+1..=j+1
        let average = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            result[idx] = average;
        }
        i = j + 1;
    }
    result
}
