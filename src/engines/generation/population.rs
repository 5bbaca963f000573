use crate::config::{AppConfig, EvolutionConfig, TradingConfig, VariantConfig};
use crate::data::FeatureFeed;
use crate::engines::generation::{
    elite::EliteSet,
    operators::SelectionPool,
    progress::ProgressCallback,
};
use crate::engines::policy::Policy;
use crate::engines::simulation::{Agent, Cohort};
use crate::error::{EvotraderError, Result};
use crate::persistence::PolicyStore;
use crate::types::{architecture_signature, CohortReport, GenerationSummary};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Drives generations: spawns cohorts, replays them, keeps the elite set, selects parents,
/// and checkpoints the best policy ever seen.
///
/// All random draws come from one seeded `StdRng` and happen before any cohort runs, so a
/// run is reproducible for a given seed whether or not cohorts run in parallel.
pub struct PopulationManager {
    evolution: EvolutionConfig,
    trading: TradingConfig,
    symbol: String,
    store: Option<Box<dyn PolicyStore>>,
    rng: StdRng,
    generation_index: usize,
    pool: SelectionPool,
    best_ever: Option<Agent>,
    checkpoint_dirty: bool,
}

impl PopulationManager {
    pub fn new(config: &AppConfig, store: Option<Box<dyn PolicyStore>>) -> Result<Self> {
        config.validate()?;

        let rng = match config.evolution.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            evolution: config.evolution.clone(),
            trading: config.trading.clone(),
            symbol: config.persistence.symbol.clone(),
            store,
            rng,
            generation_index: 0,
            pool: SelectionPool::default(),
            best_ever: None,
            checkpoint_dirty: false,
        })
    }

    /// Run the configured number of generations.
    pub fn run<C: ProgressCallback>(
        &mut self,
        feed: &FeatureFeed,
        mut callback: C,
    ) -> Result<Vec<GenerationSummary>> {
        let mut summaries = Vec::with_capacity(self.evolution.generations);
        for _ in 0..self.evolution.generations {
            summaries.push(self.run_generation(feed, &mut callback)?);
        }
        Ok(summaries)
    }

    /// One full evaluation + selection cycle across all cohorts.
    pub fn run_generation<C: ProgressCallback>(
        &mut self,
        feed: &FeatureFeed,
        callback: &mut C,
    ) -> Result<GenerationSummary> {
        let generation = self.generation_index;
        callback.on_generation_start(generation);

        let input_size = feed.input_size(self.trading.window_rows);
        if input_size == 0 {
            return Err(EvotraderError::Simulation(
                "feature feed has no columns".to_string(),
            ));
        }

        let cohorts = self.spawn_cohorts(input_size)?;
        let outcomes = self.replay(cohorts, feed)?;

        let mut elite = EliteSet::new(self.evolution.elite_size);
        let mut cohort_reports: Vec<CohortReport> = Vec::with_capacity(outcomes.len());
        for (agents, report) in outcomes {
            callback.on_cohort_complete(generation, &report);
            elite.extend(agents);
            cohort_reports.push(report);
        }

        let best_fitness = elite.best().map(|a| a.fitness).unwrap_or(0.0);
        let (new_best, checkpointed) = self.record_best(elite.best());

        let mut parents = elite.into_agents();
        if !new_best {
            if let Some(best) = &self.best_ever {
                parents.push(best.clone());
            }
        }
        self.pool = SelectionPool::new(parents);

        let pool = self
            .pool
            .agents()
            .iter()
            .zip(self.pool.probabilities())
            .map(|(agent, p)| agent.report(*p))
            .collect();

        let summary = GenerationSummary {
            generation,
            best_fitness,
            best_ever_fitness: self.best_ever.as_ref().map(|a| a.fitness).unwrap_or(0.0),
            new_best,
            checkpointed,
            cohorts: cohort_reports,
            pool,
        };
        callback.on_generation_complete(&summary);

        self.generation_index += 1;
        Ok(summary)
    }

    /// Replace `best_ever` when `candidate` strictly beats it, and checkpoint the new best
    /// if its fitness is positive. Returns `(new_best, checkpointed)`.
    fn record_best(&mut self, candidate: Option<&Agent>) -> (bool, bool) {
        let Some(candidate) = candidate else {
            return (false, false);
        };
        let previous_best = self
            .best_ever
            .as_ref()
            .map(|a| a.fitness)
            .unwrap_or(f64::NEG_INFINITY);
        if candidate.fitness <= previous_best {
            return (false, false);
        }

        self.best_ever = Some(candidate.clone());
        let checkpointed = candidate.fitness > 0.0 && self.checkpoint();
        (true, checkpointed)
    }

    fn spawn_cohorts(&mut self, input_size: usize) -> Result<Vec<Cohort>> {
        let generation = self.generation_index;
        let variants = self.evolution.variants.clone();
        let mut cohorts = Vec::with_capacity(variants.len());
        let mut next_id = 0;

        for (v, variant) in variants.iter().enumerate() {
            let mut agents = Vec::with_capacity(self.evolution.population_size);

            if self.pool.is_empty() {
                let checkpoint = self.load_checkpoint(variant, input_size);
                for slot in 0..self.evolution.population_size {
                    let agent = match &checkpoint {
                        Some(policy) if slot == 0 => Agent::new(next_id, v, policy.clone()),
                        Some(policy) => {
                            let mut policy = policy.clone();
                            policy.mutate(
                                self.evolution.mutation_rate,
                                self.evolution.mutation_scale,
                                &mut self.rng,
                            );
                            Agent::new(next_id, v, policy)
                        }
                        None => {
                            let policy = Policy::for_variant(
                                input_size,
                                variant,
                                &self.evolution,
                                &mut self.rng,
                            )?;
                            Agent::new(next_id, v, policy)
                        }
                    };
                    agents.push(agent.born_in(generation));
                    next_id += 1;
                }
            } else {
                for _ in 0..self.evolution.population_size {
                    let parent = self.pool.select(&mut self.rng).ok_or_else(|| {
                        EvotraderError::Simulation("selection pool is empty".to_string())
                    })?;
                    let child = parent.offspring(
                        next_id,
                        v,
                        self.evolution.mutation_rate,
                        self.evolution.mutation_scale,
                        &mut self.rng,
                    );
                    agents.push(child.born_in(generation));
                    next_id += 1;
                }
            }

            cohorts.push(Cohort::new(v, agents));
        }

        Ok(cohorts)
    }

    fn replay(
        &self,
        cohorts: Vec<Cohort>,
        feed: &FeatureFeed,
    ) -> Result<Vec<(Vec<Agent>, CohortReport)>> {
        let parallel = self.evolution.parallel;
        let trading = &self.trading;

        if parallel {
            cohorts
                .into_par_iter()
                .map(|cohort| cohort.run(feed, trading, parallel))
                .collect()
        } else {
            cohorts
                .into_iter()
                .map(|cohort| cohort.run(feed, trading, parallel))
                .collect()
        }
    }

    /// Stored policy for a variant, if one exists and fits the current input and layout.
    fn load_checkpoint(&self, variant: &VariantConfig, input_size: usize) -> Option<Policy> {
        let store = self.store.as_ref()?;
        let signature = variant.signature();

        let policy = match store.load(&self.symbol, &signature) {
            Ok(Some(policy)) => policy,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Ignoring checkpoint {}/{}: {}", self.symbol, signature, e);
                return None;
            }
        };

        let widths_match = match &variant.widths {
            Some(widths) => widths.as_slice() == policy.architecture(),
            None => policy.architecture().len() == variant.hidden_layers,
        };
        if policy.input_size() != input_size || !widths_match {
            log::warn!(
                "Ignoring checkpoint {}/{}: stored shape {} -> {:?} \
                 does not fit input {} with {:?}",
                self.symbol,
                signature,
                policy.input_size(),
                policy.architecture(),
                input_size,
                variant
            );
            return None;
        }

        log::info!("Loaded checkpoint {}/{}", self.symbol, signature);
        Some(policy)
    }

    /// Persist the best-ever policy. Failures are logged and leave the checkpoint dirty.
    fn checkpoint(&mut self) -> bool {
        let (Some(store), Some(best)) = (self.store.as_ref(), self.best_ever.as_ref()) else {
            return false;
        };
        let signature = architecture_signature(best.policy.architecture().len());

        match store.save(&self.symbol, &signature, &best.policy) {
            Ok(()) => {
                log::info!(
                    "Stored agent {}/{} ({} parameters) with fitness {:.4} as {}/{}",
                    best.generation,
                    best.id,
                    best.policy.parameter_count(),
                    best.fitness,
                    self.symbol,
                    signature
                );
                self.checkpoint_dirty = false;
                true
            }
            Err(e) => {
                log::warn!("Checkpoint of agent {} failed: {}", best.id, e);
                self.checkpoint_dirty = true;
                false
            }
        }
    }

    /// End the run: retry a failed checkpoint write and hand back the best agent.
    pub fn finish(mut self) -> Result<Option<Agent>> {
        if self.checkpoint_dirty && !self.checkpoint() {
            return Err(EvotraderError::Persistence(
                "final checkpoint flush failed".to_string(),
            ));
        }
        Ok(self.best_ever)
    }

    pub fn generation_index(&self) -> usize {
        self.generation_index
    }

    pub fn best_ever(&self) -> Option<&Agent> {
        self.best_ever.as_ref()
    }

    pub fn pool(&self) -> &SelectionPool {
        &self.pool
    }
}
