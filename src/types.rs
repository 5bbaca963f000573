use serde::{Deserialize, Serialize};

/// Number of policy outputs: one score per `Action`.
pub const OUTPUT_NODES: usize = 3;

/// Discrete trading decision, indexed the same way as the policy output vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// Map an output index to an action. Anything past the sell slot is a hold.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Buy,
            1 => Self::Sell,
            _ => Self::Hold,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Buy => 0,
            Self::Sell => 1,
            Self::Hold => 2,
        }
    }
}

/// Open position state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Position {
    Flat,
    Long { entry_price: f64 },
}

impl Position {
    pub fn is_long(&self) -> bool {
        matches!(self, Self::Long { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Cumulative profit dropped below zero
    Loss,
    /// Too many steps without closing a trade
    Stagnation,
}

/// Per-action signal counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    pub buy: u64,
    pub sell: u64,
    pub hold: u64,
}

impl ActionCounts {
    pub fn record(&mut self, action: Action) {
        match action {
            Action::Buy => self.buy += 1,
            Action::Sell => self.sell += 1,
            Action::Hold => self.hold += 1,
        }
    }
}

/// Row reported to the progress sink for each agent in the selection pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    pub agent_id: usize,
    /// Generation the agent was born in; `(generation, agent_id)` is unique in a pool
    pub generation: usize,
    pub variant: usize,
    pub fitness: f64,
    pub probability: f64,
    pub trade_count: u64,
    pub profitable_trade_count: u64,
    pub closed_trade_count: u64,
    pub profit: f64,
    pub step_count: u64,
    pub holding_steps: u64,
    pub actions: ActionCounts,
    /// Cause and step of death, `None` for survivors
    pub death: Option<(DeathCause, u64)>,
}

/// Outcome of one cohort replay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CohortReport {
    pub variant: usize,
    pub agents: usize,
    pub steps: usize,
    pub survivors: usize,
    pub loss_deaths: usize,
    pub stagnation_deaths: usize,
}

/// Everything the manager knows about a finished generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub best_fitness: f64,
    pub best_ever_fitness: f64,
    pub new_best: bool,
    pub checkpointed: bool,
    pub cohorts: Vec<CohortReport>,
    pub pool: Vec<AgentReport>,
}

/// Checkpoint key for a policy with `hidden_layers` hidden layers
pub fn architecture_signature(hidden_layers: usize) -> String {
    format!("{}_layers", hidden_layers)
}
