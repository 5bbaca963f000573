use crate::engines::simulation::Agent;
use std::cmp::Ordering;

/// Best agents of a generation across all cohorts, fitness descending, at most `max_size`.
pub struct EliteSet {
    agents: Vec<Agent>,
    max_size: usize,
}

impl EliteSet {
    pub fn new(max_size: usize) -> Self {
        Self {
            agents: Vec::with_capacity(max_size + 1),
            max_size,
        }
    }

    /// Offer an agent; returns whether it made the cut. Earlier entries win fitness ties.
    pub fn try_add(&mut self, agent: Agent) -> bool {
        if self.agents.len() >= self.max_size {
            match self.agents.last() {
                Some(worst) if agent.fitness <= worst.fitness => return false,
                _ => {}
            }
        }

        let position = self
            .agents
            .iter()
            .position(|a| agent.fitness.partial_cmp(&a.fitness) == Some(Ordering::Greater))
            .unwrap_or(self.agents.len());
        self.agents.insert(position, agent);
        self.agents.truncate(self.max_size);
        true
    }

    pub fn extend<I: IntoIterator<Item = Agent>>(&mut self, agents: I) {
        for agent in agents {
            self.try_add(agent);
        }
    }

    pub fn best(&self) -> Option<&Agent> {
        self.agents.first()
    }

    pub fn get_all(&self) -> &[Agent] {
        &self.agents
    }

    pub fn into_agents(self) -> Vec<Agent> {
        self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
