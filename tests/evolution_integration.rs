use chrono::NaiveDate;
use formula_discovery::config::EvolutionConfig;
use formula_discovery::engines::generation::{
    run_evolution, run_evolution_with_rng, ChannelProgressCallback, EvolutionEngine,
    GenerationStats, ProgressCallback, ProgressMessage,
};
use formula_discovery::engines::metrics::{calculate_fitness, FitnessType};
use formula_discovery::{TrainingExample, TrainingInputs};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Records the best fitness of every generation.
struct TestProgressCallback {
    best_per_generation: Vec<f64>,
    starts: usize,
}

impl TestProgressCallback {
    fn new() -> Self {
        Self {
            best_per_generation: Vec::new(),
            starts: 0,
        }
    }
}

impl ProgressCallback for TestProgressCallback {
    fn on_generation_start(&mut self, _generation: usize) {
        self.starts += 1;
    }

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        assert_eq!(stats.generation, self.best_per_generation.len());
        self.best_per_generation.push(stats.best_fitness);
    }
}

fn variables() -> Vec<String> {
    vec!["cagr".to_string(), "volatility".to_string(), "sharpe".to_string()]
}

/// Target equals cagr; volatility and sharpe are noise-free distractors.
fn cagr_examples(count: usize) -> Vec<TrainingExample> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
    (0..count)
        .map(|i| {
            let cagr = ((i * 37) % 100) as f64 / 200.0 - 0.2;
            TrainingExample {
                symbol: format!("SYM{}", i % 10),
                as_of: start + chrono::Duration::days(i as i64),
                target_date: start + chrono::Duration::days(i as i64 + 365),
                inputs: TrainingInputs {
                    cagr,
                    volatility: 0.1 + (i % 7) as f64 / 20.0,
                    sharpe: if i % 3 == 0 { None } else { Some(1.0 - (i % 5) as f64 / 4.0) },
                    ..Default::default()
                },
                target_return: cagr,
            }
        })
        .collect()
}

fn config(seed: u64) -> EvolutionConfig {
    EvolutionConfig {
        population_size: 80,
        max_generations: 25,
        elitism_count: 3,
        seed: Some(seed),
        ..Default::default()
    }
}

#[test]
fn test_evolution_converges_on_identity_target() {
    let examples = cagr_examples(60);
    let best = run_evolution(&variables(), &examples, &config(2024)).unwrap();

    assert!(best.raw_fitness < 1e-3, "raw fitness {} for {}", best.raw_fitness, best.formula);
    assert!(best.formula.variables().contains("cagr"));
}

#[test]
fn test_elitism_never_loses_the_best() {
    let examples = cagr_examples(40);
    let mut engine = EvolutionEngine::new(config(7), variables()).unwrap();
    let mut callback = TestProgressCallback::new();
    let best = engine.run(&examples, &mut callback).unwrap();

    assert_eq!(callback.starts, 26);
    assert_eq!(callback.best_per_generation.len(), 26);
    for pair in callback.best_per_generation.windows(2) {
        assert!(pair[1] <= pair[0], "best fitness regressed: {:?}", pair);
    }
    assert_eq!(best.fitness, *callback.best_per_generation.last().unwrap());
    assert!(best.fitness <= callback.best_per_generation[0]);
}

#[test]
fn test_reported_fitness_matches_recomputation() {
    let examples = cagr_examples(40);
    let config = EvolutionConfig {
        fitness_type: FitnessType::Rmse,
        ..config(31)
    };
    let best = run_evolution(&variables(), &examples, &config).unwrap();

    let raw = calculate_fitness(&best.formula, &examples, FitnessType::Rmse);
    assert!((raw - best.raw_fitness).abs() < 1e-12);
}

#[test]
fn test_spearman_search_finds_monotone_formula() {
    let examples = cagr_examples(50);
    let config = EvolutionConfig {
        fitness_type: FitnessType::Spearman,
        ..config(5)
    };
    let best = run_evolution(&variables(), &examples, &config).unwrap();
    assert!(best.raw_fitness < 0.05, "spearman fitness {}", best.raw_fitness);
}

#[test]
fn test_injected_generator_is_deterministic() {
    let examples = cagr_examples(30);
    let mut config = config(0);
    config.seed = None;
    config.max_generations = 5;

    let a = run_evolution_with_rng(&variables(), &examples, &config, StdRng::seed_from_u64(77)).unwrap();
    let b = run_evolution_with_rng(&variables(), &examples, &config, StdRng::seed_from_u64(77)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_channel_progress_reports_every_generation() {
    let examples = cagr_examples(30);
    let config = EvolutionConfig {
        max_generations: 4,
        ..config(3)
    };
    let (sender, receiver) = std::sync::mpsc::channel();
    let mut engine = EvolutionEngine::new(config, variables()).unwrap();
    engine
        .run(&examples, &mut ChannelProgressCallback::new(sender))
        .unwrap();

    let messages: Vec<ProgressMessage> = receiver.try_iter().collect();
    let completed: Vec<usize> = messages
        .iter()
        .filter_map(|m| match m {
            ProgressMessage::GenerationComplete(stats) => Some(stats.generation),
            ProgressMessage::GenerationStart(_) => None,
        })
        .collect();
    assert_eq!(messages.len(), 10);
    assert_eq!(completed, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_empty_training_set_scores_worst() {
    let best = run_evolution(&variables(), &[], &EvolutionConfig {
        population_size: 10,
        max_generations: 2,
        elitism_count: 1,
        seed: Some(1),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(best.raw_fitness, f64::MAX);
}
