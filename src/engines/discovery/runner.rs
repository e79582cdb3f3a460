use super::record::DiscoveredFormula;
use crate::config::{AppConfig, DiscoveryConfig, EvolutionConfig};
use crate::engines::formula::BoundFormula;
use crate::engines::generation::{EvolutionEngine, LogProgressCallback};
use crate::engines::metrics::ValidationMetrics;
use crate::engines::preprocessing::{
    split_by_regime, ChronologicalSplitter, FeatureNormalizer, RegimeRange,
};
use crate::error::Result;
use crate::types::{SecurityType, TrainingExample};
use rayon::prelude::*;

/// One evolution run: a security type restricted to one regime bucket (or all).
#[derive(Debug, Clone)]
struct DiscoveryJob {
    index: usize,
    regime_range: Option<RegimeRange>,
    examples: Vec<TrainingExample>,
}

impl DiscoveryJob {
    fn label(&self, security_type: SecurityType) -> String {
        match &self.regime_range {
            Some(range) => format!("{}/{}", security_type, range.name),
            None => format!("{}/all", security_type),
        }
    }
}

/// Drives discovery for one security type: preprocessing, one evolution per
/// regime bucket, and out-of-sample scoring of each winner.
///
/// Each run gets its own generator, seeded `seed + run index` when a seed is
/// configured, so parallel and sequential execution give the same formulas.
pub struct DiscoveryRunner {
    evolution: EvolutionConfig,
    discovery: DiscoveryConfig,
}

impl DiscoveryRunner {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            evolution: config.evolution,
            discovery: config.discovery,
        })
    }

    pub fn discover(
        &self,
        security_type: SecurityType,
        examples: &[TrainingExample],
    ) -> Result<Vec<DiscoveredFormula>> {
        let normalizer = if self.discovery.normalize_features {
            Some(FeatureNormalizer::fit(examples))
        } else {
            None
        };
        let prepared = match &normalizer {
            Some(normalizer) => normalizer.apply(examples),
            None => examples.to_vec(),
        };

        let splitter = ChronologicalSplitter::new(self.discovery.train_fraction);
        let jobs: Vec<DiscoveryJob> = self
            .build_jobs(prepared)
            .into_iter()
            .filter(|job| {
                let count = job.examples.len();
                if count < self.discovery.min_examples {
                    log::warn!(
                        "Skipping {}: {} examples, need at least {}",
                        job.label(security_type),
                        count,
                        self.discovery.min_examples
                    );
                    return false;
                }
                if !splitter.can_split(count) {
                    log::warn!(
                        "Skipping {}: train fraction {} leaves no training or validation rows out of {}",
                        job.label(security_type),
                        self.discovery.train_fraction,
                        count
                    );
                    return false;
                }
                true
            })
            .collect();

        log::info!(
            "Discovering {} formula(s) for {} from {} examples",
            jobs.len(),
            security_type,
            examples.len()
        );

        let run = |job: &DiscoveryJob| self.run_job(security_type, job, normalizer.as_ref());
        if self.discovery.parallel {
            jobs.par_iter().map(run).collect()
        } else {
            jobs.iter().map(run).collect()
        }
    }

    fn build_jobs(&self, examples: Vec<TrainingExample>) -> Vec<DiscoveryJob> {
        if !self.discovery.split_by_regime {
            return vec![DiscoveryJob {
                index: 0,
                regime_range: None,
                examples,
            }];
        }

        let mut buckets = split_by_regime(&examples, &self.discovery.regime_ranges);
        self.discovery
            .regime_ranges
            .iter()
            .enumerate()
            .map(|(index, range)| DiscoveryJob {
                index,
                regime_range: Some(range.clone()),
                examples: buckets.remove(range).unwrap_or_default(),
            })
            .collect()
    }

    fn run_job(
        &self,
        security_type: SecurityType,
        job: &DiscoveryJob,
        normalizer: Option<&FeatureNormalizer>,
    ) -> Result<DiscoveredFormula> {
        let label = job.label(security_type);
        let split = ChronologicalSplitter::new(self.discovery.train_fraction).split(&job.examples)?;

        let mut config = self.evolution.clone();
        config.seed = self.evolution.seed.map(|seed| seed.wrapping_add(job.index as u64));

        let mut engine = EvolutionEngine::new(config, self.discovery.variables.clone())?;
        let best = engine.run(&split.train, &mut LogProgressCallback::new(label.clone()))?;

        let bound = BoundFormula::bind(&best.formula)?;
        let training = ValidationMetrics::calculate(&bound, &split.train);
        let validation = ValidationMetrics::calculate(&bound, &split.validation);

        log::info!(
            "[{}] discovered {} (train MAE {:.6}, validation MAE {:.6}, validation spearman {:.4})",
            label,
            best.formula,
            training.mae,
            validation.mae,
            validation.spearman
        );

        Ok(DiscoveredFormula {
            formula: best.formula_text(),
            security_type,
            regime_range: job.regime_range.clone(),
            fitness_type: self.evolution.fitness_type,
            fitness: best.fitness,
            raw_fitness: best.raw_fitness,
            complexity: best.complexity,
            training,
            validation,
            train_end: split.train_end,
            validation_start: split.validation_start,
            normalization: normalizer.cloned(),
            discovered_at: chrono::Utc::now(),
        })
    }
}
