use agora_core::AgentId;
use agora_ports::EconomicAgent;
use std::collections::HashMap;

/// Owns every live agent in the simulation. Markets borrow agents from the
/// pool for the duration of a settlement; the driver removes bankrupt
/// agents here after deregistering them from their markets.
#[derive(Default)]
pub struct AgentPool {
    agents: HashMap<AgentId, Box<dyn EconomicAgent>>,
}

impl AgentPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent: Box<dyn EconomicAgent>) {
        self.agents.insert(agent.id(), agent);
    }

    pub fn get(&self, id: AgentId) -> Option<&dyn EconomicAgent> {
        self.agents.get(&id).map(Box::as_ref)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Box<dyn EconomicAgent>> {
        self.agents.get_mut(&id)
    }

    pub fn remove(&mut self, id: AgentId) -> Option<Box<dyn EconomicAgent>> {
        self.agents.remove(&id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn ids(&self) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self.agents.keys().copied().collect();
        ids.sort();
        ids
    }
}
