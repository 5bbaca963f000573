use super::agent::Agent;
use crate::config::TradingConfig;
use crate::data::FeatureFeed;
use crate::error::{EvotraderError, Result};
use crate::types::{CohortReport, DeathCause};
use rayon::prelude::*;

/// Agents sharing one architecture variant, replayed together over the feature feed.
pub struct Cohort {
    variant: usize,
    agents: Vec<Agent>,
    dead_agents: Vec<Agent>,
}

impl Cohort {
    pub fn new(variant: usize, agents: Vec<Agent>) -> Self {
        Self {
            variant,
            agents,
            dead_agents: Vec::new(),
        }
    }

    pub fn variant(&self) -> usize {
        self.variant
    }

    pub fn live(&self) -> &[Agent] {
        &self.agents
    }

    pub fn dead(&self) -> &[Agent] {
        &self.dead_agents
    }

    /// Advance every live agent by one step, then move the dying ones to the dead set.
    ///
    /// Agents never see each other's state, so thinking in parallel gives the same result
    /// as the sequential order; deaths are committed afterwards in agent order.
    pub fn step(
        &mut self,
        window: &[f64],
        price: f64,
        trading: &TradingConfig,
        parallel: bool,
    ) -> Result<()> {
        if parallel {
            self.agents
                .par_iter_mut()
                .try_for_each(|agent| agent.think(window, price, trading.fee).map(|_| ()))?;
        } else {
            for agent in self.agents.iter_mut() {
                agent.think(window, price, trading.fee)?;
            }
        }

        let mut survivors = Vec::with_capacity(self.agents.len());
        for mut agent in self.agents.drain(..) {
            match agent.death_check(trading.stagnation_limit) {
                Some(cause) => {
                    log::debug!(
                        "Agent {} died ({:?}) at step {} with profit {:.4}",
                        agent.id,
                        cause,
                        agent.step_count,
                        agent.cumulative_profit
                    );
                    agent.kill(cause);
                    self.dead_agents.push(agent);
                }
                None => survivors.push(agent),
            }
        }
        self.agents = survivors;

        Ok(())
    }

    /// Replay the whole feed, then score every agent, dead or alive.
    ///
    /// Stops early once every agent is dead. A feed too short for one window is a valid
    /// empty pass.
    pub fn run(
        mut self,
        feed: &FeatureFeed,
        trading: &TradingConfig,
        parallel: bool,
    ) -> Result<(Vec<Agent>, CohortReport)> {
        let total = self.agents.len();
        let steps = feed.steps(trading.window_rows);

        if steps > 0 {
            if trading.price_column >= feed.width() {
                return Err(EvotraderError::Simulation(format!(
                    "price column {} out of range for {} feature columns",
                    trading.price_column,
                    feed.width()
                )));
            }
            let input_size = feed.input_size(trading.window_rows);
            if let Some(agent) = self.agents.iter().find(|a| a.policy.input_size() != input_size) {
                return Err(EvotraderError::shape(
                    format!("agent {} policy input", agent.id),
                    input_size,
                    agent.policy.input_size(),
                ));
            }
        }

        let mut replayed = 0;
        for step in 0..steps {
            if self.agents.is_empty() {
                break;
            }
            let window = feed.window(step, trading.window_rows);
            let price = feed.price(step, trading.window_rows, trading.price_column);
            self.step(&window, price, trading, parallel)?;
            replayed += 1;
        }

        let survivors = self.agents.len();
        let loss_deaths = self
            .dead_agents
            .iter()
            .filter(|a| matches!(a.death(), Some((DeathCause::Loss, _))))
            .count();

        let report = CohortReport {
            variant: self.variant,
            agents: total,
            steps: replayed,
            survivors,
            loss_deaths,
            stagnation_deaths: self.dead_agents.len() - loss_deaths,
        };

        let mut all = self.agents;
        all.append(&mut self.dead_agents);
        for agent in all.iter_mut() {
            agent.finalize(trading.fitness_scale);
        }

        Ok((all, report))
    }
}
