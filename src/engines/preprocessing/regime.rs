use crate::types::TrainingExample;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Top of the regime score scale. A range ending here includes it.
pub const REGIME_SCORE_MAX: f64 = 1.0;

/// Band of regime scores, half-open `[min, max)` unless `max` is the top of
/// the scale, in which case it is closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeRange {
    pub min: f64,
    pub max: f64,
    pub name: String,
}

impl RegimeRange {
    pub fn new(min: f64, max: f64, name: impl Into<String>) -> Self {
        Self {
            min,
            max,
            name: name.into(),
        }
    }

    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && (score < self.max || (self.max >= REGIME_SCORE_MAX && score <= self.max))
    }
}

// Ranges are used as map keys, so equality is bitwise on the bounds.
impl PartialEq for RegimeRange {
    fn eq(&self, other: &Self) -> bool {
        self.min.to_bits() == other.min.to_bits()
            && self.max.to_bits() == other.max.to_bits()
            && self.name == other.name
    }
}

impl Eq for RegimeRange {}

impl Hash for RegimeRange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.min.to_bits().hash(state);
        self.max.to_bits().hash(state);
        self.name.hash(state);
    }
}

/// bear `[-1.0, -0.3)`, neutral `[-0.3, 0.3)`, bull `[0.3, 1.0]`.
pub fn default_regime_ranges() -> Vec<RegimeRange> {
    vec![
        RegimeRange::new(-1.0, -0.3, "bear"),
        RegimeRange::new(-0.3, 0.3, "neutral"),
        RegimeRange::new(0.3, 1.0, "bull"),
    ]
}

/// First range containing `score`, in iteration order.
pub fn classify_regime(score: f64, ranges: &[RegimeRange]) -> Option<&RegimeRange> {
    ranges.iter().find(|range| range.contains(score))
}

/// Buckets examples by regime score. Every supplied range is a key, possibly
/// with no examples; examples outside all ranges are dropped.
///
/// Ranges must be ordered and non-overlapping.
pub fn split_by_regime(
    examples: &[TrainingExample],
    ranges: &[RegimeRange],
) -> HashMap<RegimeRange, Vec<TrainingExample>> {
    let mut buckets: HashMap<RegimeRange, Vec<TrainingExample>> = ranges
        .iter()
        .map(|range| (range.clone(), Vec::new()))
        .collect();

    let mut unassigned = 0;
    for example in examples {
        match classify_regime(example.inputs.regime_score, ranges) {
            Some(range) => {
                if let Some(bucket) = buckets.get_mut(range) {
                    bucket.push(example.clone());
                }
            }
            None => unassigned += 1,
        }
    }

    if unassigned > 0 {
        log::warn!(
            "{} of {} examples fall outside every regime range",
            unassigned,
            examples.len()
        );
    }

    buckets
}

/// Examples whose regime score lies in the closed interval `[min, max]`.
pub fn filter_by_regime_range(
    examples: &[TrainingExample],
    min: f64,
    max: f64,
) -> Vec<TrainingExample> {
    examples
        .iter()
        .filter(|e| e.inputs.regime_score >= min && e.inputs.regime_score <= max)
        .cloned()
        .collect()
}
