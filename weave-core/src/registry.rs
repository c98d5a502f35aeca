//! Agent registry - keyed storage of agent records

use std::collections::HashMap;

use crate::{Agent, AgentId, Result, WeaveError};

/// Keyed store of agents, iterated in insertion order
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, Agent>,
    order: Vec<AgentId>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an agent; its id must not already be present
    pub fn add(&mut self, agent: Agent) -> Result<()> {
        if self.agents.contains_key(&agent.id) {
            return Err(WeaveError::DuplicateId(agent.id));
        }
        self.order.push(agent.id.clone());
        self.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    /// All agents in insertion order
    pub fn all(&self) -> impl Iterator<Item = &Agent> {
        self.order.iter().filter_map(|id| self.agents.get(id))
    }

    /// Mutable access to every agent, in no particular order
    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.values_mut()
    }

    pub fn ids(&self) -> &[AgentId] {
        &self.order
    }

    /// Agents matching an arbitrary predicate
    pub fn filter<P>(&self, predicate: P) -> Vec<&Agent>
    where
        P: Fn(&Agent) -> bool,
    {
        self.all().filter(|agent| predicate(agent)).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AgentProfile;
    use chrono::Utc;

    fn agent(id: &str, role: &str) -> Agent {
        Agent::from_profile(id.to_string(), AgentProfile::new(id, role), 0.1, Utc::now())
    }

    #[test]
    fn test_add_and_get() {
        let mut registry = AgentRegistry::new();
        registry.add(agent("a", "Pattern Seer")).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").map(|a| a.role.as_str()), Some("Pattern Seer"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = AgentRegistry::new();
        registry.add(agent("a", "Pattern Seer")).unwrap();

        let err = registry.add(agent("a", "Wisdom Keeper")).unwrap_err();
        assert_eq!(err, WeaveError::DuplicateId("a".into()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().role, "Pattern Seer");
    }

    #[test]
    fn test_insertion_order() {
        let mut registry = AgentRegistry::new();
        for id in ["c", "a", "b"] {
            registry.add(agent(id, "Sacred Weaver")).unwrap();
        }

        let ids: Vec<&str> = registry.all().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_filter() {
        let mut registry = AgentRegistry::new();
        registry.add(agent("a", "Pattern Seer")).unwrap();
        registry.add(agent("b", "Wisdom Keeper")).unwrap();
        registry.add(agent("c", "Pattern Seer")).unwrap();

        let seers = registry.filter(|a| a.role == "Pattern Seer");
        assert_eq!(seers.len(), 2);
    }
}
