use crate::config::{ConfigSection, EvolutionConfig};
use crate::engines::formula::Node;
use crate::engines::generation::{
    generator::random_formula,
    individual::{sort_population, FormulaWithFitness},
    operators::{crossover, mutate_with_recursion, tournament_selection},
};
use crate::engines::metrics::EvaluationSet;
use crate::error::{DiscoveryError, Result};
use crate::types::{Feature, TrainingExample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Summary of one generation, handed to progress callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_fitness: f64,
    pub best_raw_fitness: f64,
    pub best_complexity: usize,
    pub mean_fitness: f64,
    pub best_formula: String,
}

impl GenerationStats {
    fn from_sorted(generation: usize, population: &[FormulaWithFitness]) -> Self {
        let best = &population[0];
        let mean_fitness =
            population.iter().map(|p| p.fitness).sum::<f64>() / population.len() as f64;
        Self {
            generation,
            best_fitness: best.fitness,
            best_raw_fitness: best.raw_fitness,
            best_complexity: best.complexity,
            mean_fitness,
            best_formula: best.formula_text(),
        }
    }
}

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    /// Generation 0 is the initial random population.
    fn on_generation_complete(&mut self, stats: &GenerationStats);
}

/// Generational tree-based GP driver.
///
/// Owns its random source, so separate engines never share one and runs are
/// reproducible from `EvolutionConfig::seed`.
pub struct EvolutionEngine<R: Rng = StdRng> {
    config: EvolutionConfig,
    variables: Vec<String>,
    rng: R,
}

impl EvolutionEngine<StdRng> {
    pub fn new(config: EvolutionConfig, variables: Vec<String>) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, variables, rng)
    }
}

impl<R: Rng> EvolutionEngine<R> {
    pub fn with_rng(config: EvolutionConfig, variables: Vec<String>, rng: R) -> Result<Self> {
        config.validate()?;

        for name in &variables {
            if Feature::from_name(name).is_none() {
                log::warn!("Variable '{}' is not a recognized feature and will read as 0.0", name);
            }
        }

        Ok(Self {
            config,
            variables,
            rng,
        })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Runs the full search and returns the best individual of the final generation.
    pub fn run<C: ProgressCallback>(
        &mut self,
        examples: &[TrainingExample],
        callback: &mut C,
    ) -> Result<FormulaWithFitness> {
        if examples.is_empty() {
            log::warn!("Evolution started without training examples; every formula scores worst");
        }
        let set = EvaluationSet::from_examples(examples);
        log::info!(
            "Starting evolution: {} individuals, {} generations, {} examples, {} variables",
            self.config.population_size,
            self.config.max_generations,
            set.len(),
            self.variables.len()
        );

        callback.on_generation_start(0);
        let mut population = self.initialize_population(&set);
        callback.on_generation_complete(&GenerationStats::from_sorted(0, &population));

        for generation in 1..=self.config.max_generations {
            callback.on_generation_start(generation);
            population = self.create_next_generation(&population, &set);
            callback.on_generation_complete(&GenerationStats::from_sorted(generation, &population));
        }

        let best = population.into_iter().next().ok_or_else(|| {
            DiscoveryError::Validation("Evolution finished with an empty population".to_string())
        })?;

        log::info!(
            "Evolution finished: fitness {:.6} (raw {:.6}), {} nodes :: {}",
            best.fitness,
            best.raw_fitness,
            best.complexity,
            best.formula
        );

        Ok(best)
    }

    fn score(&self, formula: Node, set: &EvaluationSet) -> FormulaWithFitness {
        FormulaWithFitness::evaluate(
            formula,
            set,
            self.config.fitness_type,
            self.config.complexity_weight,
        )
    }

    fn initialize_population(&mut self, set: &EvaluationSet) -> Vec<FormulaWithFitness> {
        let mut population = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let formula = random_formula(
                &self.variables,
                self.config.max_tree_depth,
                self.config.max_node_count,
                &mut self.rng,
            );
            population.push(self.score(formula, set));
        }
        sort_population(&mut population);
        population
    }

    /// `population` must already be sorted best first.
    fn create_next_generation(
        &mut self,
        population: &[FormulaWithFitness],
        set: &EvaluationSet,
    ) -> Vec<FormulaWithFitness> {
        let mut next_generation: Vec<FormulaWithFitness> =
            Vec::with_capacity(self.config.population_size);

        // Elitism: copy top performers
        next_generation.extend(population.iter().take(self.config.elitism_count).cloned());

        while next_generation.len() < self.config.population_size {
            let child = if self.rng.gen::<f64>() < self.config.crossover_rate {
                let parents =
                    tournament_selection(population, self.config.tournament_size, 2, &mut self.rng);
                let (child1, child2) =
                    crossover(&parents[0].formula, &parents[1].formula, &mut self.rng);
                if self.rng.gen_bool(0.5) {
                    child1
                } else {
                    child2
                }
            } else {
                let parents =
                    tournament_selection(population, self.config.tournament_size, 1, &mut self.rng);
                parents[0].formula.clone()
            };

            let child = mutate_with_recursion(
                &child,
                &self.variables,
                self.config.mutation_rate,
                self.config.mutation_recursion,
                &mut self.rng,
            );
            next_generation.push(self.score(child, set));
        }

        sort_population(&mut next_generation);
        next_generation
    }
}

/// Runs one evolution with a generator seeded from `config.seed` (or entropy).
pub fn run_evolution(
    variables: &[String],
    examples: &[TrainingExample],
    config: &EvolutionConfig,
) -> Result<FormulaWithFitness> {
    let mut engine = EvolutionEngine::new(config.clone(), variables.to_vec())?;
    engine.run(examples, &mut super::progress::SilentProgress)
}

/// Same as `run_evolution` but draws from the caller's generator.
pub fn run_evolution_with_rng<R: Rng>(
    variables: &[String],
    examples: &[TrainingExample],
    config: &EvolutionConfig,
    rng: R,
) -> Result<FormulaWithFitness> {
    let mut engine = EvolutionEngine::with_rng(config.clone(), variables.to_vec(), rng)?;
    engine.run(examples, &mut super::progress::SilentProgress)
}
