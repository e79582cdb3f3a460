pub mod fitness;
pub mod validation;

pub use fitness::{
    adjusted_fitness, calculate_complexity, calculate_fitness, score_predictions,
    spearman_correlation, EvaluationSet, FitnessType, WORST_FITNESS,
};
pub use validation::ValidationMetrics;
