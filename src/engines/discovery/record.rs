use crate::engines::formula::{parse_formula, BoundFormula, Node};
use crate::engines::metrics::{FitnessType, ValidationMetrics};
use crate::engines::preprocessing::{FeatureNormalizer, RegimeRange};
use crate::error::ParseError;
use crate::types::{SecurityType, TrainingInputs};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one discovery run, in the shape the storage layer persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredFormula {
    /// Canonical formula text; parses back with `parse_formula`.
    pub formula: String,
    pub security_type: SecurityType,
    /// `None` when discovery ran over all regimes at once.
    pub regime_range: Option<RegimeRange>,
    pub fitness_type: FitnessType,
    pub fitness: f64,
    pub raw_fitness: f64,
    pub complexity: usize,
    pub training: ValidationMetrics,
    pub validation: ValidationMetrics,
    pub train_end: NaiveDate,
    pub validation_start: NaiveDate,
    /// Feature scaling the formula was trained under, if any.
    pub normalization: Option<FeatureNormalizer>,
    pub discovered_at: DateTime<Utc>,
}

impl DiscoveredFormula {
    pub fn parse(&self) -> Result<Node, ParseError> {
        parse_formula(&self.formula)
    }

    /// Scoring function over raw inputs, applying the recorded normalization first.
    pub fn scoring_function(&self) -> Result<impl Fn(&TrainingInputs) -> f64 + Send + Sync, ParseError> {
        let bound = BoundFormula::bind(&self.parse()?)?;
        let normalization = self.normalization.clone();
        Ok(move |inputs: &TrainingInputs| match &normalization {
            Some(normalizer) => bound.evaluate_inputs(&normalizer.normalize_inputs(inputs)),
            None => bound.evaluate_inputs(inputs),
        })
    }
}
