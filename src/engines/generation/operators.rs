use crate::engines::simulation::Agent;
use rand::Rng;

/// Share of the summed fitness held by each entry. Non-positive fitness carries no mass;
/// if nothing carries mass every probability is zero.
pub fn selection_probabilities(fitness: &[f64]) -> Vec<f64> {
    let total: f64 = fitness.iter().map(|f| f.max(0.0)).sum();
    fitness
        .iter()
        .map(|f| if total > 0.0 { f.max(0.0) / total } else { 0.0 })
        .collect()
}

/// Roulette wheel selection: draw in `[0, total)` and walk the list subtracting each
/// candidate's fitness until the remainder goes negative.
///
/// Returns `None` for an empty list. When no candidate has positive fitness the draw is
/// uniform.
pub fn roulette_selection<R: Rng>(fitness: &[f64], rng: &mut R) -> Option<usize> {
    if fitness.is_empty() {
        return None;
    }

    let total: f64 = fitness.iter().map(|f| f.max(0.0)).sum();
    if total <= 0.0 {
        return Some(rng.gen_range(0..fitness.len()));
    }

    let mut spin = rng.gen::<f64>() * total;
    for (i, f) in fitness.iter().enumerate() {
        spin -= f.max(0.0);
        if spin < 0.0 {
            return Some(i);
        }
    }

    // rounding can leave a tiny non-negative remainder
    fitness.iter().rposition(|f| *f > 0.0)
}

/// Parents for the next generation with their reproduction probabilities.
#[derive(Default)]
pub struct SelectionPool {
    agents: Vec<Agent>,
    fitness: Vec<f64>,
    probabilities: Vec<f64>,
}

impl SelectionPool {
    /// Fitness at or below zero is clamped to zero before normalizing.
    pub fn new(mut agents: Vec<Agent>) -> Self {
        for agent in agents.iter_mut() {
            if agent.fitness <= 0.0 {
                agent.fitness = 0.0;
            }
        }
        let fitness: Vec<f64> = agents.iter().map(|a| a.fitness).collect();
        let probabilities = selection_probabilities(&fitness);
        Self {
            agents,
            fitness,
            probabilities,
        }
    }

    pub fn select<R: Rng>(&self, rng: &mut R) -> Option<&Agent> {
        roulette_selection(&self.fitness, rng).map(|i| &self.agents[i])
    }

    pub fn total_fitness(&self) -> f64 {
        self.fitness.iter().sum()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
