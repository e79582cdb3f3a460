pub mod evolution_engine;
pub mod generator;
pub mod individual;
pub mod operators;
pub mod progress;

pub use evolution_engine::{
    run_evolution, run_evolution_with_rng, EvolutionEngine, GenerationStats, ProgressCallback,
};
pub use generator::{random_formula, random_terminal};
pub use individual::FormulaWithFitness;
pub use operators::{
    crossover, mutate, mutate_with_recursion, tournament_selection, MutationRecursion,
};
pub use progress::{ChannelProgressCallback, LogProgressCallback, ProgressMessage, SilentProgress};
