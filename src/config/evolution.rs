use super::traits::ConfigSection;
use crate::engines::generation::operators::MutationRecursion;
use crate::engines::metrics::FitnessType;
use crate::error::DiscoveryError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub max_tree_depth: usize,
    pub max_node_count: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub tournament_size: usize,
    pub elitism_count: usize,
    pub fitness_type: FitnessType,
    /// Added to raw fitness once per node.
    pub complexity_weight: f64,
    pub mutation_recursion: MutationRecursion,
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 50,
            max_tree_depth: 5,
            max_node_count: 15,
            mutation_rate: 0.2,
            crossover_rate: 0.7,
            tournament_size: 5,
            elitism_count: 5,
            fitness_type: FitnessType::Mae,
            complexity_weight: 0.001,
            mutation_recursion: MutationRecursion::LeftOnly,
            seed: None,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), DiscoveryError> {
        if self.population_size == 0 {
            return Err(DiscoveryError::Configuration(
                "Population size must be at least 1".to_string()
            ));
        }
        if self.elitism_count > self.population_size {
            return Err(DiscoveryError::Configuration(format!(
                "Elitism count {} exceeds population size {}",
                self.elitism_count, self.population_size
            )));
        }
        if self.tournament_size == 0 {
            return Err(DiscoveryError::Configuration(
                "Tournament size must be at least 1".to_string()
            ));
        }
        if self.max_node_count == 0 {
            return Err(DiscoveryError::Configuration(
                "Max node count must be at least 1".to_string()
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(DiscoveryError::Configuration(
                "Mutation rate must be between 0 and 1".to_string()
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(DiscoveryError::Configuration(
                "Crossover rate must be between 0 and 1".to_string()
            ));
        }
        if !self.complexity_weight.is_finite() || self.complexity_weight < 0.0 {
            return Err(DiscoveryError::Configuration(
                "Complexity weight must be a non-negative number".to_string()
            ));
        }
        Ok(())
    }
}
