use evotrader::config::{AppConfig, VariantConfig};
use evotrader::engines::generation::{
    roulette_selection, ConsoleProgressCallback, ProgressCallback, SelectionPool,
};
use evotrader::persistence::{MemoryPolicyStore, PolicyStore};
use evotrader::types::{CohortReport, GenerationSummary};
use evotrader::{Agent, FeatureFeed, Policy, PopulationManager};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Records what the manager reports
#[derive(Default)]
struct RecordingCallback {
    started: Vec<usize>,
    cohorts: Vec<(usize, CohortReport)>,
}

impl ProgressCallback for RecordingCallback {
    fn on_generation_start(&mut self, generation: usize) {
        self.started.push(generation);
    }

    fn on_cohort_complete(&mut self, generation: usize, report: &CohortReport) {
        self.cohorts.push((generation, report.clone()));
    }

    fn on_generation_complete(&mut self, _summary: &GenerationSummary) {}
}

/// Oscillating price with a mild uptrend plus two derived features
fn synthetic_feed(rows: usize) -> FeatureFeed {
    let rows = (0..rows)
        .map(|i| {
            let t = i as f64;
            let price = 1.0 + 0.001 * t + 0.05 * (t / 6.0).sin();
            vec![price, (t / 11.0).cos(), (t / 3.0).sin() * 0.5]
        })
        .collect();
    FeatureFeed::from_rows(rows).unwrap()
}

fn config(seed: u64, parallel: bool) -> AppConfig {
    let mut config = AppConfig::default();
    config.evolution.seed = Some(seed);
    config.evolution.population_size = 6;
    config.evolution.elite_size = 5;
    config.evolution.generations = 4;
    config.evolution.mutation_rate = 0.2;
    config.evolution.parallel = parallel;
    config.evolution.variants = vec![
        VariantConfig::with_depth(1),
        VariantConfig::with_widths(vec![5, 4]),
    ];
    config.trading.window_rows = 4;
    config.trading.stagnation_limit = 30;
    config
}

fn fingerprint(summaries: &[GenerationSummary]) -> Vec<(usize, u64, u64, u64)> {
    summaries
        .iter()
        .flat_map(|s| {
            s.pool
                .iter()
                .map(|r| (r.agent_id, r.fitness.to_bits(), r.probability.to_bits(), r.step_count))
        })
        .collect()
}

fn agent_with_fitness(id: usize, fitness: f64) -> Agent {
    let mut rng = StdRng::seed_from_u64(id as u64);
    let mut agent = Agent::new(id, 0, Policy::random(3, &[2], &mut rng).unwrap());
    agent.fitness = fitness;
    agent
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let feed = synthetic_feed(300);

    let mut first = PopulationManager::new(&config(42, false), None).unwrap();
    let a = first.run(&feed, ConsoleProgressCallback).unwrap();

    let mut second = PopulationManager::new(&config(42, true), None).unwrap();
    let b = second.run(&feed, ConsoleProgressCallback).unwrap();

    assert_eq!(a.len(), 4);
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn test_generation_bookkeeping() {
    let feed = synthetic_feed(200);
    let mut manager = PopulationManager::new(&config(7, true), None).unwrap();
    let mut recorder = RecordingCallback::default();

    let summaries = manager.run(&feed, &mut recorder).unwrap();

    assert_eq!(recorder.started, vec![0, 1, 2, 3]);
    assert_eq!(recorder.cohorts.len(), 8);
    assert!(recorder.cohorts.iter().all(|(_, r)| r.agents == 6));
    assert_eq!(manager.generation_index(), 4);

    let mut best_ever = f64::NEG_INFINITY;
    for s in &summaries {
        // elite set plus, at most, the carried-over best agent
        assert!(!s.pool.is_empty() && s.pool.len() <= 6);
        let total: f64 = s.pool.iter().map(|r| r.probability).sum();
        assert!(total == 0.0 || (total - 1.0).abs() < 1e-9);
        assert!(s.pool.windows(2).take(4).all(|w| w[0].fitness >= w[1].fitness));
        assert!(s.best_ever_fitness >= best_ever);
        best_ever = s.best_ever_fitness;

        let mut keys: Vec<_> = s.pool.iter().map(|r| (r.generation, r.agent_id)).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), s.pool.len());
        if !s.new_best && s.generation > 0 {
            let carried = s.pool.last().unwrap();
            assert!(carried.generation < s.generation);
        }
    }
}

#[test]
fn test_checkpoint_follows_best_ever() {
    let feed = synthetic_feed(300);
    let store = Arc::new(MemoryPolicyStore::new());
    let mut manager =
        PopulationManager::new(&config(11, true), Some(Box::new(store.clone()))).unwrap();

    let summaries = manager.run(&feed, ConsoleProgressCallback).unwrap();
    for s in &summaries {
        if s.checkpointed {
            assert!(s.new_best);
            assert!(s.best_fitness > 0.0);
        }
    }

    let best = manager.finish().unwrap().expect("a best agent is always recorded");
    if summaries.iter().any(|s| s.checkpointed) {
        let signature = format!("{}_layers", best.policy.architecture().len());
        let stored = store.load("BNBBTC", &signature).unwrap().unwrap();
        assert_eq!(stored, best.policy);
    } else {
        assert!(store.is_empty());
    }
}

#[test]
fn test_second_run_resumes_from_checkpoint() {
    let store = Arc::new(MemoryPolicyStore::new());
    let mut rng = StdRng::seed_from_u64(5);
    let stored = Policy::random(12, &[5, 4], &mut rng).unwrap();
    store.save("BNBBTC", "2_layers", &stored).unwrap();

    let mut config = config(3, false);
    config.evolution.variants = vec![VariantConfig::with_widths(vec![5, 4])];
    config.evolution.generations = 1;

    let mut manager = PopulationManager::new(&config, Some(Box::new(store.clone()))).unwrap();
    let summaries = manager.run(&synthetic_feed(120), ConsoleProgressCallback).unwrap();
    assert_eq!(summaries[0].cohorts[0].agents, 6);
}

#[test]
fn test_selection_pool_probabilities() {
    let pool = SelectionPool::new(vec![
        agent_with_fitness(0, 40.0),
        agent_with_fitness(1, 30.0),
        agent_with_fitness(2, 20.0),
        agent_with_fitness(3, 10.0),
    ]);

    assert_eq!(pool.probabilities()[0], 0.4);
    assert_eq!(pool.total_fitness(), 100.0);

    let draws = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..20).map(|_| pool.select(&mut rng).unwrap().id).collect::<Vec<_>>()
    };
    assert_eq!(draws(1), draws(1));
}

#[test]
fn test_degenerate_pool_still_selects() {
    let pool = SelectionPool::new(vec![agent_with_fitness(0, -3.0), agent_with_fitness(1, 0.0)]);
    assert!(pool.probabilities().iter().all(|p| *p == 0.0));
    assert!(pool.agents().iter().all(|a| a.fitness == 0.0));

    let mut rng = StdRng::seed_from_u64(4);
    assert!(pool.select(&mut rng).is_some());
    assert_eq!(roulette_selection(&[0.0, 5.0], &mut rng), Some(1));
}
