use crate::engines::policy::Policy;
use crate::error::Result;
use crate::types::{Action, ActionCounts, AgentReport, DeathCause, Position};
use rand::Rng;

/// One simulated trader: an owned policy plus long-only position state and counters.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: usize,
    /// Generation the agent was born in
    pub generation: usize,
    /// Index of the cohort variant the agent was born into
    pub variant: usize,
    pub policy: Policy,
    pub position: Position,
    /// Compounded return ratio of all closed trades
    pub cumulative_profit: f64,
    /// Running sum of `cumulative_profit` while alive, replaced by the final score
    pub fitness: f64,
    pub step_count: u64,
    pub trade_count: u64,
    pub profitable_trade_count: u64,
    pub loss_trade_count: u64,
    pub holding_steps: u64,
    pub actions: ActionCounts,
    last_close_step: u64,
    death: Option<(DeathCause, u64)>,
}

impl Agent {
    pub fn new(id: usize, variant: usize, policy: Policy) -> Self {
        Self {
            id,
            generation: 0,
            variant,
            policy,
            position: Position::Flat,
            cumulative_profit: 0.0,
            fitness: 0.0,
            step_count: 0,
            trade_count: 0,
            profitable_trade_count: 0,
            loss_trade_count: 0,
            holding_steps: 0,
            actions: ActionCounts::default(),
            last_close_step: 0,
            death: None,
        }
    }

    pub fn born_in(mut self, generation: usize) -> Self {
        self.generation = generation;
        self
    }

    /// Fresh agent wrapping a mutated copy of this agent's policy.
    pub fn offspring<R: Rng>(
        &self,
        id: usize,
        variant: usize,
        mutation_rate: f64,
        mutation_scale: f64,
        rng: &mut R,
    ) -> Self {
        let mut policy = self.policy.clone();
        policy.mutate(mutation_rate, mutation_scale, rng);
        Self::new(id, variant, policy)
    }

    /// One decision step: query the policy, trade at `price`, accumulate fitness.
    pub fn think(&mut self, window: &[f64], price: f64, fee: f64) -> Result<Action> {
        self.step_count += 1;
        if self.position.is_long() {
            self.holding_steps += 1;
        }

        let action = self.policy.decide(window)?;
        self.actions.record(action);
        self.apply(action, price, fee);

        self.fitness += self.cumulative_profit;
        Ok(action)
    }

    /// Position state machine. Buying while long, selling while flat and holding are no-ops.
    pub fn apply(&mut self, action: Action, price: f64, fee: f64) {
        match (action, self.position) {
            (Action::Buy, Position::Flat) => {
                // a zero or negative price cannot anchor a return ratio
                if price > 0.0 && price.is_finite() {
                    self.position = Position::Long { entry_price: price };
                    self.trade_count += 1;
                }
            }
            (Action::Sell, Position::Long { entry_price }) => {
                self.position = Position::Flat;
                let net = price * (1.0 - fee).powi(2);
                let trade_return = (net - entry_price) / entry_price;

                if trade_return > 0.0 {
                    self.profitable_trade_count += 1;
                } else {
                    self.loss_trade_count += 1;
                }
                self.cumulative_profit =
                    (self.cumulative_profit + 1.0) * (trade_return + 1.0) - 1.0;
                self.last_close_step = self.step_count;
            }
            _ => {}
        }
    }

    /// Death rule evaluated after every step.
    pub fn death_check(&self, stagnation_limit: u64) -> Option<DeathCause> {
        if self.cumulative_profit < 0.0 {
            Some(DeathCause::Loss)
        } else if self.step_count - self.last_close_step >= stagnation_limit {
            Some(DeathCause::Stagnation)
        } else {
            None
        }
    }

    pub fn kill(&mut self, cause: DeathCause) {
        if self.death.is_none() {
            self.death = Some((cause, self.step_count));
        }
    }

    pub fn is_alive(&self) -> bool {
        self.death.is_none()
    }

    pub fn death(&self) -> Option<(DeathCause, u64)> {
        self.death
    }

    pub fn closed_trades(&self) -> u64 {
        self.profitable_trade_count + self.loss_trade_count
    }

    /// End-of-pass score: clamped profit weighted by `scale`, plus the step count for any
    /// agent that traded at least once.
    pub fn final_score(&self, scale: f64) -> f64 {
        let profit = self.cumulative_profit.max(0.0);
        let longevity = if self.trade_count > 0 {
            self.step_count as f64
        } else {
            0.0
        };
        profit * scale + longevity
    }

    pub fn finalize(&mut self, scale: f64) {
        self.fitness = self.final_score(scale);
    }

    pub fn report(&self, probability: f64) -> AgentReport {
        AgentReport {
            agent_id: self.id,
            generation: self.generation,
            variant: self.variant,
            fitness: self.fitness,
            probability,
            trade_count: self.trade_count,
            profitable_trade_count: self.profitable_trade_count,
            closed_trade_count: self.closed_trades(),
            profit: self.cumulative_profit,
            step_count: self.step_count,
            holding_steps: self.holding_steps,
            actions: self.actions,
            death: self.death,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn agent() -> Agent {
        let mut rng = StdRng::seed_from_u64(1);
        Agent::new(0, 0, Policy::random(2, &[2], &mut rng).unwrap())
    }

    #[test]
    fn test_losing_round_trip() {
        let mut a = agent();
        a.apply(Action::Buy, 100.0, 0.0);
        a.apply(Action::Sell, 90.0, 0.0);
        assert!((a.cumulative_profit + 0.1).abs() < 1e-12);
        assert_eq!(a.loss_trade_count, 1);
        assert_eq!(a.death_check(120), Some(DeathCause::Loss));
    }

    #[test]
    fn test_break_even_counts_as_loss() {
        let mut a = agent();
        a.apply(Action::Buy, 100.0, 0.0);
        a.apply(Action::Sell, 100.0, 0.0);
        assert_eq!(a.cumulative_profit, 0.0);
        assert_eq!(a.loss_trade_count, 1);
        assert_eq!(a.profitable_trade_count, 0);
    }

    #[test]
    fn test_buy_at_zero_price_ignored() {
        let mut a = agent();
        a.apply(Action::Buy, 0.0, 0.001);
        assert_eq!(a.position, Position::Flat);
        assert_eq!(a.trade_count, 0);
    }

    #[test]
    fn test_compounding() {
        let mut a = agent();
        a.apply(Action::Buy, 100.0, 0.0);
        a.apply(Action::Sell, 110.0, 0.0);
        a.apply(Action::Buy, 100.0, 0.0);
        a.apply(Action::Sell, 110.0, 0.0);
        assert!((a.cumulative_profit - 0.21).abs() < 1e-12);
    }

    #[test]
    fn test_stagnation() {
        let mut a = agent();
        a.step_count = 119;
        assert_eq!(a.death_check(120), None);
        a.step_count = 120;
        assert_eq!(a.death_check(120), Some(DeathCause::Stagnation));
    }

    #[test]
    fn test_final_score() {
        let mut a = agent();
        a.step_count = 10;
        assert_eq!(a.final_score(100_000.0), 0.0);

        a.trade_count = 1;
        a.cumulative_profit = 0.01;
        assert!((a.final_score(100_000.0) - 1010.0).abs() < 1e-9);

        a.cumulative_profit = -0.5;
        assert_eq!(a.final_score(100_000.0), 10.0);
    }

    #[test]
    fn test_kill_keeps_first_cause() {
        let mut a = agent();
        a.step_count = 4;
        a.kill(DeathCause::Loss);
        a.step_count = 5;
        a.kill(DeathCause::Stagnation);
        assert_eq!(a.death(), Some((DeathCause::Loss, 4)));
        assert!(!a.is_alive());
    }

    #[test]
    fn test_report_carries_counters_and_death() {
        let mut a = agent().born_in(3);
        a.apply(Action::Buy, 100.0, 0.0);
        a.apply(Action::Sell, 90.0, 0.0);
        a.holding_steps = 2;
        a.actions.record(Action::Buy);
        a.actions.record(Action::Sell);
        a.step_count = 2;
        a.kill(DeathCause::Loss);

        let r = a.report(0.25);
        assert_eq!(r.generation, 3);
        assert_eq!(r.closed_trade_count, 1);
        assert_eq!(r.holding_steps, 2);
        assert_eq!((r.actions.buy, r.actions.sell, r.actions.hold), (1, 1, 0));
        assert_eq!(r.death, Some((DeathCause::Loss, 2)));
        assert_eq!(r.probability, 0.25);
    }
}
