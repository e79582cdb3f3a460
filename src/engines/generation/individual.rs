use crate::engines::formula::{BoundFormula, Node};
use crate::engines::metrics::{adjusted_fitness, EvaluationSet, FitnessType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A formula scored against a training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaWithFitness {
    pub formula: Node,
    /// Selection fitness: raw fitness plus the complexity penalty. Lower is better.
    pub fitness: f64,
    pub raw_fitness: f64,
    pub complexity: usize,
}

impl FormulaWithFitness {
    pub fn evaluate(
        formula: Node,
        set: &EvaluationSet,
        fitness_type: FitnessType,
        complexity_weight: f64,
    ) -> Self {
        let bound = BoundFormula::bind_lenient(&formula);
        let raw_fitness = set.fitness(&bound, fitness_type);
        let complexity = formula.node_count();
        Self {
            fitness: adjusted_fitness(raw_fitness, complexity, complexity_weight),
            raw_fitness,
            complexity,
            formula,
        }
    }

    pub fn formula_text(&self) -> String {
        self.formula.to_string()
    }
}

/// Ascending by selection fitness.
pub fn compare_fitness(a: &FormulaWithFitness, b: &FormulaWithFitness) -> Ordering {
    a.fitness.total_cmp(&b.fitness)
}

pub fn sort_population(population: &mut [FormulaWithFitness]) {
    population.sort_by(compare_fitness);
}
