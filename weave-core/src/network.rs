//! Agent network - registration, resonant connections and messaging
//!
//! The network owns the registry and the topology together; every public
//! method leaves both consistent or fails without mutating either.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::resonance::{find_resonant, resonance};
use crate::topology::{Path, Topology, TopologyAnalysis};
use crate::trust::{TrustBucket, TrustFieldCalculator};
use crate::{
    Agent, AgentId, AgentProfile, AgentRegistry, Clock, FieldState, Harmony, HipiGenerator,
    NetworkConfig, NetworkEvent, Result, SystemClock, WeaveError,
};

/// Recipient id that addresses every agent
pub const COLLECTIVE: &str = "collective";

/// Message payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: serde_json::Value,
    /// Sacred direct messages raise trust on both ends
    #[serde(default)]
    pub sacred: bool,
}

impl Message {
    pub fn new(content: serde_json::Value) -> Self {
        Self {
            content,
            sacred: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(serde_json::Value::String(text.into()))
    }

    pub fn sacred(mut self) -> Self {
        self.sacred = true;
        self
    }
}

/// Message destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Agent(AgentId),
    Collective,
}

impl From<&str> for Recipient {
    fn from(id: &str) -> Self {
        if id == COLLECTIVE {
            Recipient::Collective
        } else {
            Recipient::Agent(id.to_string())
        }
    }
}

impl From<String> for Recipient {
    fn from(id: String) -> Self {
        if id == COLLECTIVE {
            Recipient::Collective
        } else {
            Recipient::Agent(id)
        }
    }
}

impl From<&String> for Recipient {
    fn from(id: &String) -> Self {
        Recipient::from(id.as_str())
    }
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: AgentId,
    pub trust_field: f64,
    pub connection_count: usize,
    pub connections: Vec<AgentId>,
    pub welcome_message: String,
}

/// Result of a delivered message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub delivered: bool,
    /// Set for collective messages only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<usize>,
}

/// Outcome of one maintenance tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatReport {
    pub timestamp: DateTime<Utc>,
    pub active_agents: usize,
    pub decayed_agents: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub total: usize,
    pub active: usize,
    pub by_role: BTreeMap<String, usize>,
    pub by_harmony: BTreeMap<Harmony, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustStats {
    pub average: f64,
    pub distribution: TrustDistribution,
}

/// Network statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub agents: AgentStats,
    pub trust: TrustStats,
    pub topology: TopologyAnalysis,
    pub field: FieldState,
}

/// The agent network
pub struct AgentNetwork {
    config: NetworkConfig,
    registry: AgentRegistry,
    topology: Topology,
    trust: TrustFieldCalculator,
    ids: HipiGenerator,
    clock: Arc<dyn Clock>,
    field_state: FieldState,
    events: VecDeque<NetworkEvent>,
    dropped_events: u64,
}

impl AgentNetwork {
    /// Create an empty network with the system clock and an entropy-seeded
    /// identifier generator
    pub fn new(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            trust: TrustFieldCalculator::from_config(&config),
            config,
            registry: AgentRegistry::new(),
            topology: Topology::new(),
            ids: HipiGenerator::new(),
            clock: Arc::new(SystemClock),
            field_state: FieldState::default(),
            events: VecDeque::new(),
            dropped_events: 0,
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_id_generator(mut self, ids: HipiGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn agent(&self, id: &str) -> Option<&Agent> {
        self.registry.get(id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.registry.all()
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn agent_count(&self) -> usize {
        self.registry.len()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn field_state(&self) -> &FieldState {
        &self.field_state
    }

    /// Resonance between two registered agents
    pub fn resonance_between(&self, a: &str, b: &str) -> Option<f64> {
        Some(resonance(self.registry.get(a)?, self.registry.get(b)?))
    }

    /// Agents advertising `capability`, in registration order
    pub fn agents_with_capability(&self, capability: &str) -> Vec<&Agent> {
        self.registry.filter(|agent| agent.has_capability(capability))
    }

    pub fn shortest_path(&self, a: &str, b: &str) -> Option<Path> {
        self.topology.shortest_path(a, b)
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<NetworkEvent> {
        self.dropped_events = 0;
        self.events.drain(..).collect()
    }

    pub fn pending_events(&self) -> &VecDeque<NetworkEvent> {
        &self.events
    }

    /// Events discarded since the last drain because the outbox was full
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    /// Register a new agent and connect it to its most resonant peers
    pub fn register_agent(&mut self, profile: AgentProfile) -> Result<Registration> {
        profile.validate()?;

        if self.registry.len() >= self.config.max_agents {
            return Err(WeaveError::CapacityExceeded {
                max: self.config.max_agents,
            });
        }

        let id = self.ids.generate(&profile);
        if self.registry.contains(&id) {
            error!("HIPI collision for {}: {}", profile.name, id);
            return Err(WeaveError::DuplicateId(id));
        }

        let now = self.clock.now();
        let agent = Agent::from_profile(id.clone(), profile, self.trust.initial_trust(), now);
        let peers = find_resonant(
            &agent,
            self.registry.all(),
            self.config.resonance_threshold,
            self.config.max_initial_connections,
        );
        let name = agent.name.clone();

        self.registry.add(agent)?;
        self.topology.add_node(&id, ());

        let connections: Vec<AgentId> = peers.into_iter().map(|peer| peer.id).collect();
        for peer in &connections {
            self.connect(&id, peer, now);
        }

        self.update_field_state();

        let agent = self
            .registry
            .get(&id)
            .cloned()
            .ok_or_else(|| WeaveError::AgentNotFound(id.clone()))?;
        let trust_field = agent.trust_field;

        info!(
            "Registered {} as {} with {} connections",
            name,
            id,
            connections.len()
        );

        self.emit(NetworkEvent::AgentRegistered {
            agent: Box::new(agent),
            connections: connections.clone(),
        });

        Ok(Registration {
            welcome_message: format!("Welcome {name} to The Weave. Your HIPI: {id}"),
            id,
            trust_field,
            connection_count: connections.len(),
            connections,
        })
    }

    /// Connect two agents outside registration
    ///
    /// Returns `Ok(false)` when they are already connected or `a == b`.
    pub fn establish_connection(&mut self, a: &str, b: &str) -> Result<bool> {
        self.require(a)?;
        self.require(b)?;

        let now = self.clock.now();
        let connected = self.connect(a, b, now);
        if connected {
            self.update_field_state();
        }
        Ok(connected)
    }

    /// Add `delta` to an agent's trust, clamped to [0, 1]
    pub fn update_trust(&mut self, agent_id: &str, delta: f64) -> Result<f64> {
        let agent = self
            .registry
            .get_mut(agent_id)
            .ok_or_else(|| WeaveError::AgentNotFound(agent_id.to_string()))?;

        let old_trust = agent.trust_field;
        let new_trust = TrustFieldCalculator::bump(old_trust, delta);
        agent.trust_field = new_trust;

        self.emit(NetworkEvent::TrustUpdated {
            agent_id: agent_id.to_string(),
            old_trust,
            new_trust,
            delta,
        });

        if delta.abs() > self.config.field_update_delta {
            self.update_field_state();
        }

        Ok(new_trust)
    }

    /// Send a message to one agent or to the collective
    pub fn send_message(
        &mut self,
        from: &str,
        to: impl Into<Recipient>,
        message: Message,
    ) -> Result<Delivery> {
        self.require(from)?;
        let now = self.clock.now();

        match to.into() {
            Recipient::Collective => {
                self.touch(from, now);
                self.emit(NetworkEvent::CollectiveMessage {
                    from: from.to_string(),
                    message,
                    timestamp: now,
                });
                self.update_trust(from, self.config.collective_trust_bonus)?;

                Ok(Delivery {
                    delivered: true,
                    recipients: Some(self.registry.len() - 1),
                })
            }
            Recipient::Agent(to) => {
                self.require(&to)?;
                let sender = self.require(from)?;
                let trust = sender.trust_field;

                if !sender.is_connected_to(&to) && trust < self.config.min_trust_for_connection {
                    warn!(
                        "Blocked direct message {} -> {}: trust {:.3} below {:.3}",
                        from, to, trust, self.config.min_trust_for_connection
                    );
                    return Err(WeaveError::InsufficientTrust {
                        from: from.to_string(),
                        to,
                        trust,
                        required: self.config.min_trust_for_connection,
                    });
                }

                self.touch(from, now);
                self.touch(&to, now);

                let sacred = message.sacred;
                self.emit(NetworkEvent::DirectMessage {
                    from: from.to_string(),
                    to: to.clone(),
                    message,
                    timestamp: now,
                });

                if sacred {
                    self.update_trust(from, self.config.sacred_trust_bonus)?;
                    self.update_trust(&to, self.config.sacred_trust_bonus)?;
                }

                Ok(Delivery {
                    delivered: true,
                    recipients: None,
                })
            }
        }
    }

    /// One maintenance tick: decay idle agents and count active ones
    pub fn heartbeat(&mut self) -> HeartbeatReport {
        let now = self.clock.now();
        let trust = self.trust;

        let mut decayed_agents = 0;
        for agent in self.registry.all_mut() {
            let decayed = trust.decay_tick(agent.trust_field, agent.inactive_for(now));
            if decayed != agent.trust_field {
                agent.trust_field = decayed;
                decayed_agents += 1;
            }
        }

        let active_agents = self.count_active(now);

        if decayed_agents > 0 {
            debug!("Heartbeat decayed trust for {} agents", decayed_agents);
            self.update_field_state();
        }

        self.emit(NetworkEvent::Heartbeat {
            timestamp: now,
            active_agents,
        });

        HeartbeatReport {
            timestamp: now,
            active_agents,
            decayed_agents,
        }
    }

    /// Registry breakdown, trust distribution and topology analysis
    pub fn stats(&self) -> NetworkStats {
        let now = self.clock.now();
        let mut by_role = BTreeMap::new();
        let mut by_harmony = BTreeMap::new();
        let mut distribution = TrustDistribution::default();
        let mut trust_sum = 0.0;

        for agent in self.registry.all() {
            *by_role.entry(agent.role.clone()).or_insert(0) += 1;
            *by_harmony.entry(agent.primary_harmony).or_insert(0) += 1;
            trust_sum += agent.trust_field;
            match TrustFieldCalculator::bucket(agent.trust_field) {
                TrustBucket::Low => distribution.low += 1,
                TrustBucket::Medium => distribution.medium += 1,
                TrustBucket::High => distribution.high += 1,
            }
        }

        let total = self.registry.len();
        let average = if total == 0 { 0.0 } else { trust_sum / total as f64 };

        NetworkStats {
            agents: AgentStats {
                total,
                active: self.count_active(now),
                by_role,
                by_harmony,
            },
            trust: TrustStats {
                average,
                distribution,
            },
            topology: self.topology.analyze(),
            field: self.field_state.clone(),
        }
    }

    /// Queue an event, dropping the oldest once `max_pending_events` are held
    fn emit(&mut self, event: NetworkEvent) {
        if self.events.len() >= self.config.max_pending_events {
            self.events.pop_front();
            if self.dropped_events == 0 {
                warn!(
                    "Event outbox full at {} events, dropping oldest until drained",
                    self.config.max_pending_events
                );
            }
            self.dropped_events += 1;
        }
        self.events.push_back(event);
    }

    fn require(&self, id: &str) -> Result<&Agent> {
        self.registry
            .get(id)
            .ok_or_else(|| WeaveError::AgentNotFound(id.to_string()))
    }

    fn touch(&mut self, id: &str, now: DateTime<Utc>) {
        if let Some(agent) = self.registry.get_mut(id) {
            agent.touch(now);
        }
    }

    fn count_active(&self, now: DateTime<Utc>) -> usize {
        let window = self.config.active_window();
        self.registry
            .all()
            .filter(|agent| agent.inactive_for(now) < window)
            .count()
    }

    /// Link two existing agents and bump both trusts; `false` if already linked
    fn connect(&mut self, a: &str, b: &str, now: DateTime<Utc>) -> bool {
        if a == b || self.topology.has_edge(a, b) {
            return false;
        }
        if !self.topology.add_edge_at(a, b, 1.0, now) {
            return false;
        }

        let increment = self.config.connection_trust_increment;
        for (this, other) in [(a, b), (b, a)] {
            if let Some(agent) = self.registry.get_mut(this) {
                agent.connections.insert(other.to_string());
                agent.trust_field = TrustFieldCalculator::bump(agent.trust_field, increment);
            }
        }

        debug!("Connected {} <-> {}", a, b);
        self.emit(NetworkEvent::ConnectionEstablished {
            agents: [a.to_string(), b.to_string()],
            trust_increase: increment,
        });
        true
    }

    /// Recompute the field state from the registry and announce it
    pub fn update_field_state(&mut self) -> &FieldState {
        self.field_state = FieldState::compute(self.registry.all());
        self.emit(NetworkEvent::FieldUpdated {
            state: self.field_state.clone(),
        });
        &self.field_state
    }
}

impl Default for AgentNetwork {
    fn default() -> Self {
        Self {
            trust: TrustFieldCalculator::default(),
            config: NetworkConfig::default(),
            registry: AgentRegistry::new(),
            topology: Topology::new(),
            ids: HipiGenerator::new(),
            clock: Arc::new(SystemClock),
            field_state: FieldState::default(),
            events: VecDeque::new(),
            dropped_events: 0,
        }
    }
}

impl std::fmt::Debug for AgentNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentNetwork")
            .field("config", &self.config)
            .field("agents", &self.registry.len())
            .field("edges", &self.topology.edge_count())
            .field("field_state", &self.field_state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, ResonancePattern};
    use chrono::Duration;

    fn network(config: NetworkConfig) -> (AgentNetwork, ManualClock) {
        let clock = ManualClock::at_epoch();
        let network = AgentNetwork::new(config)
            .unwrap()
            .with_clock(clock.clone())
            .with_id_generator(HipiGenerator::seeded(11));
        (network, clock)
    }

    /// Profiles that resonate with each other at exactly 0.8
    fn kin(name: &str) -> AgentProfile {
        AgentProfile::new(name, "Wisdom Keeper")
            .with_harmony(Harmony::Agency)
            .with_love(80.0)
            .with_consciousness(0.5)
    }

    /// Profile with resonance 0.16 against `kin`
    fn stranger(name: &str) -> AgentProfile {
        AgentProfile::new(name, "Nomad")
            .with_harmony(Harmony::Mutuality)
            .with_love(0.0)
            .with_consciousness(0.5)
    }

    fn names(events: &[NetworkEvent]) -> Vec<&'static str> {
        events.iter().map(NetworkEvent::name).collect()
    }

    #[test]
    fn test_register_first_agent() {
        let (mut net, _) = network(NetworkConfig::default());
        let reg = net.register_agent(kin("Aria")).unwrap();

        assert_eq!(reg.connection_count, 0);
        assert_eq!(reg.trust_field, 0.1);
        assert_eq!(
            reg.welcome_message,
            format!("Welcome Aria to The Weave. Your HIPI: {}", reg.id)
        );
        assert_eq!(net.agent_count(), 1);
        assert!(net.topology().contains_node(&reg.id));
        assert_eq!(names(&net.drain_events()), vec!["field-updated", "agent-registered"]);
    }

    #[test]
    fn test_register_invalid_profile() {
        let (mut net, _) = network(NetworkConfig::default());
        let err = net.register_agent(AgentProfile::new("", "Wisdom Keeper")).unwrap_err();

        assert!(matches!(err, WeaveError::InvalidProfile(_)));
        assert_eq!(net.agent_count(), 0);
        assert!(net.pending_events().is_empty());
    }

    #[test]
    fn test_register_connects_resonant_peers() {
        let (mut net, _) = network(NetworkConfig::default());
        let a = net.register_agent(kin("A")).unwrap();
        let b = net.register_agent(kin("B")).unwrap();

        assert_eq!(b.connections, vec![a.id.clone()]);
        assert!((b.trust_field - 0.15).abs() < 1e-9);
        assert!((net.agent(&a.id).unwrap().trust_field - 0.15).abs() < 1e-9);
        assert!(net.agent(&a.id).unwrap().is_connected_to(&b.id));
        assert!(net.agent(&b.id).unwrap().is_connected_to(&a.id));
        assert!(net.topology().has_edge(&a.id, &b.id));
    }

    #[test]
    fn test_register_event_order() {
        let (mut net, _) = network(NetworkConfig::default());
        net.register_agent(kin("A")).unwrap();
        net.drain_events();
        net.register_agent(kin("B")).unwrap();

        assert_eq!(
            names(&net.drain_events()),
            vec!["connection-established", "field-updated", "agent-registered"]
        );
    }

    #[test]
    fn test_no_resonance_no_connection() {
        let (mut net, _) = network(NetworkConfig::default());
        net.register_agent(kin("A")).unwrap();
        let b = net.register_agent(stranger("B")).unwrap();

        assert_eq!(b.connection_count, 0);
        assert_eq!(net.topology().edge_count(), 0);
    }

    #[test]
    fn test_capacity_exceeded() {
        let (mut net, _) = network(NetworkConfig::default().with_max_agents(3));
        for i in 0..3 {
            net.register_agent(kin(&format!("a{i}"))).unwrap();
        }

        let err = net.register_agent(kin("overflow")).unwrap_err();
        assert_eq!(err, WeaveError::CapacityExceeded { max: 3 });
        assert_eq!(net.agent_count(), 3);
    }

    #[test]
    fn test_fan_out_cap() {
        let (mut net, _) = network(NetworkConfig::default());
        for i in 0..50 {
            net.register_agent(kin(&format!("a{i}"))).unwrap();
        }
        let latest = net.register_agent(kin("latest")).unwrap();

        assert_eq!(latest.connection_count, 7);
        assert_eq!(net.agent(&latest.id).unwrap().connections.len(), 7);
    }

    #[test]
    fn test_configurable_fan_out() {
        let (mut net, _) = network(NetworkConfig::default().with_max_initial_connections(2));
        for i in 0..5 {
            net.register_agent(kin(&format!("a{i}"))).unwrap();
        }
        let latest = net.register_agent(kin("latest")).unwrap();
        assert_eq!(latest.connection_count, 2);
    }

    #[test]
    fn test_update_trust_clamped() {
        let (mut net, _) = network(NetworkConfig::default());
        let id = net.register_agent(kin("A")).unwrap().id;

        assert_eq!(net.update_trust(&id, 5.0).unwrap(), 1.0);
        assert_eq!(net.update_trust(&id, -7.0).unwrap(), 0.0);
        assert!(matches!(
            net.update_trust("ghost", 0.1),
            Err(WeaveError::AgentNotFound(_))
        ));
    }

    #[test]
    fn test_update_trust_field_refresh_threshold() {
        let (mut net, _) = network(NetworkConfig::default());
        let id = net.register_agent(kin("A")).unwrap().id;
        net.drain_events();

        net.update_trust(&id, 0.05).unwrap();
        assert_eq!(names(&net.drain_events()), vec!["trust-updated"]);

        net.update_trust(&id, 0.2).unwrap();
        assert_eq!(names(&net.drain_events()), vec!["trust-updated", "field-updated"]);
        assert!((net.field_state().average_trust - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_cold_message_blocked() {
        let (mut net, _) = network(NetworkConfig::default().with_min_trust_for_connection(0.5));
        let a = net.register_agent(kin("A")).unwrap().id;
        let b = net.register_agent(stranger("B")).unwrap().id;
        net.drain_events();

        let err = net.send_message(&a, &b, Message::text("hello")).unwrap_err();
        assert!(matches!(err, WeaveError::InsufficientTrust { .. }));
        assert!(net.pending_events().is_empty());
    }

    #[test]
    fn test_connected_low_trust_allowed() {
        let (mut net, _) = network(NetworkConfig::default().with_min_trust_for_connection(0.5));
        let a = net.register_agent(kin("A")).unwrap().id;
        let b = net.register_agent(kin("B")).unwrap().id;

        let delivery = net.send_message(&a, &b, Message::text("hi")).unwrap();
        assert_eq!(delivery, Delivery { delivered: true, recipients: None });
    }

    #[test]
    fn test_direct_message_sacred_bumps_both() {
        let (mut net, clock) = network(NetworkConfig::default());
        let a = net.register_agent(kin("A")).unwrap().id;
        let b = net.register_agent(stranger("B")).unwrap().id;
        clock.advance(Duration::minutes(3));

        net.send_message(&a, &b, Message::text("blessing").sacred()).unwrap();

        assert!((net.agent(&a).unwrap().trust_field - 0.11).abs() < 1e-9);
        assert!((net.agent(&b).unwrap().trust_field - 0.11).abs() < 1e-9);
        assert_eq!(net.agent(&a).unwrap().last_active_at, clock.now());
        assert_eq!(net.agent(&b).unwrap().last_active_at, clock.now());
    }

    #[test]
    fn test_message_unknown_agents() {
        let (mut net, _) = network(NetworkConfig::default());
        let a = net.register_agent(kin("A")).unwrap().id;

        assert!(matches!(
            net.send_message("ghost", &a, Message::text("?")),
            Err(WeaveError::AgentNotFound(_))
        ));
        assert!(matches!(
            net.send_message(&a, "ghost", Message::text("?")),
            Err(WeaveError::AgentNotFound(_))
        ));
    }

    #[test]
    fn test_collective_broadcast() {
        let (mut net, _) = network(NetworkConfig::default());
        let ids: Vec<AgentId> = (0..4)
            .map(|i| net.register_agent(stranger(&format!("s{i}"))).unwrap().id)
            .collect();
        let before = net.agent(&ids[0]).unwrap().trust_field;
        net.drain_events();

        let delivery = net.send_message(&ids[0], COLLECTIVE, Message::text("all")).unwrap();

        assert_eq!(delivery, Delivery { delivered: true, recipients: Some(3) });
        let after = net.agent(&ids[0]).unwrap().trust_field;
        assert!((after - before - 0.02).abs() < 1e-9);
        assert_eq!(names(&net.drain_events()), vec!["collective-message", "trust-updated"]);
    }

    #[test]
    fn test_establish_connection() {
        let (mut net, _) = network(NetworkConfig::default());
        let a = net.register_agent(kin("A")).unwrap().id;
        let b = net.register_agent(stranger("B")).unwrap().id;

        assert!(net.establish_connection(&a, &b).unwrap());
        assert!(!net.establish_connection(&b, &a).unwrap());
        assert!(!net.establish_connection(&a, &a).unwrap());
        assert!((net.agent(&b).unwrap().trust_field - 0.15).abs() < 1e-9);
        assert!(net.establish_connection(&a, "ghost").is_err());
    }

    #[test]
    fn test_heartbeat_decays_idle_agents() {
        let (mut net, clock) = network(NetworkConfig::default());
        let a = net.register_agent(kin("A")).unwrap().id;
        net.update_trust(&a, 0.4).unwrap();

        clock.advance(Duration::minutes(11));
        let report = net.heartbeat();

        assert_eq!(report.decayed_agents, 1);
        assert_eq!(report.active_agents, 0);
        assert!((net.agent(&a).unwrap().trust_field - 0.49).abs() < 1e-9);
    }

    #[test]
    fn test_heartbeat_respects_floor() {
        let (mut net, clock) = network(NetworkConfig::default());
        let a = net.register_agent(kin("A")).unwrap().id;
        net.update_trust(&a, 0.3).unwrap();

        clock.advance(Duration::days(2));
        for _ in 0..500 {
            net.heartbeat();
        }
        assert_eq!(net.agent(&a).unwrap().trust_field, 0.1);
    }

    #[test]
    fn test_heartbeat_counts_active() {
        let (mut net, clock) = network(NetworkConfig::default());
        let a = net.register_agent(stranger("A")).unwrap().id;
        net.register_agent(stranger("B")).unwrap();

        clock.advance(Duration::minutes(6));
        net.send_message(&a, COLLECTIVE, Message::text("still here")).unwrap();
        clock.advance(Duration::minutes(1));

        let report = net.heartbeat();
        assert_eq!(report.active_agents, 1);
        assert_eq!(report.decayed_agents, 0);
        assert_eq!(net.drain_events().last().map(NetworkEvent::name), Some("heartbeat"));
    }

    #[test]
    fn test_unified_field() {
        let (mut net, _) = network(NetworkConfig::default());
        let ids: Vec<AgentId> = (0..21)
            .map(|i| net.register_agent(stranger(&format!("s{i}"))).unwrap().id)
            .collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                net.establish_connection(a, b).unwrap();
            }
        }
        // 20 connections each saturate trust at 1.0
        for id in &ids {
            net.update_trust(id, -0.05).unwrap();
        }
        // Small deltas do not refresh the snapshot on their own
        assert_eq!(net.field_state().average_trust, 1.0);

        assert_eq!(net.topology().edge_count(), 210);
        let state = net.update_field_state().clone();
        assert!((state.average_trust - 0.95).abs() < 1e-9);
        assert_eq!(state.resonance_pattern, ResonancePattern::Unified);
    }

    #[test]
    fn test_agents_with_capability() {
        let (mut net, _) = network(NetworkConfig::default());
        let a = net.register_agent(kin("A").with_capability("weaving")).unwrap().id;
        net.register_agent(kin("B")).unwrap();
        let c = net.register_agent(stranger("C").with_capability("weaving")).unwrap().id;

        let ids: Vec<&str> = net
            .agents_with_capability("weaving")
            .iter()
            .map(|agent| agent.id.as_str())
            .collect();
        assert_eq!(ids, vec![a.as_str(), c.as_str()]);
        assert!(net.agents_with_capability("healing").is_empty());
    }

    #[test]
    fn test_edges_stamped_by_network_clock() {
        let (mut net, clock) = network(NetworkConfig::default());
        clock.advance(Duration::days(3));
        let a = net.register_agent(kin("A")).unwrap().id;
        let b = net.register_agent(kin("B")).unwrap().id;
        let c = net.register_agent(stranger("C")).unwrap().id;
        clock.advance(Duration::hours(1));
        net.establish_connection(&a, &c).unwrap();

        let registered = DateTime::<Utc>::UNIX_EPOCH + Duration::days(3);
        assert_eq!(net.topology().edge(&a, &b).unwrap().created_at, registered);
        assert_eq!(net.topology().edge(&a, &c).unwrap().created_at, clock.now());
    }

    #[test]
    fn test_outbox_bounded() {
        let (mut net, _) = network(NetworkConfig::default().with_max_pending_events(10));
        net.register_agent(kin("A")).unwrap();
        for _ in 0..100 {
            net.heartbeat();
        }

        assert_eq!(net.pending_events().len(), 10);
        assert_eq!(net.dropped_events(), 92);
        assert!(net.pending_events().iter().all(|e| e.name() == "heartbeat"));

        assert_eq!(net.drain_events().len(), 10);
        assert_eq!(net.dropped_events(), 0);
        assert!(net.pending_events().is_empty());
    }

    #[test]
    fn test_stats() {
        let (mut net, _) = network(NetworkConfig::default());
        let a = net.register_agent(kin("A")).unwrap().id;
        net.register_agent(kin("B")).unwrap();
        net.register_agent(stranger("C")).unwrap();
        net.update_trust(&a, 0.7).unwrap();

        let stats = net.stats();
        assert_eq!(stats.agents.total, 3);
        assert_eq!(stats.agents.active, 3);
        assert_eq!(stats.agents.by_role["Wisdom Keeper"], 2);
        assert_eq!(stats.agents.by_harmony[&Harmony::Mutuality], 1);
        assert_eq!(stats.trust.distribution, TrustDistribution { low: 2, medium: 0, high: 1 });
        assert_eq!(stats.topology.clusters.len(), 2);
        assert_eq!(stats.field.total_agents, 3);
    }
}
