//! Network configuration

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{Result, WeaveError};

/// Tunables for an [`AgentNetwork`](crate::AgentNetwork)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Registry capacity
    pub max_agents: usize,
    /// Trust an unconnected sender needs to message someone directly
    pub min_trust_for_connection: f64,
    /// Trust removed per heartbeat tick from inactive agents
    pub trust_decay_rate: f64,
    /// Minimum resonance for a registration-time connection
    pub resonance_threshold: f64,
    /// Fan-out cap for registration-time connections
    pub max_initial_connections: usize,
    /// Starting trust and lower bound for decay
    pub trust_floor: f64,
    /// Trust added to both ends of a new connection
    pub connection_trust_increment: f64,
    /// Trust added to the sender of a collective message
    pub collective_trust_bonus: f64,
    /// Trust added to both ends of a sacred direct message
    pub sacred_trust_bonus: f64,
    /// Trust changes larger than this recompute the field state
    pub field_update_delta: f64,
    /// Inactivity before decay starts (ms)
    pub inactivity_threshold_ms: i64,
    /// Window for counting an agent as active (ms)
    pub active_window_ms: i64,
    /// Undrained events kept before the oldest are dropped
    pub max_pending_events: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_agents: 1000,
            min_trust_for_connection: 0.1,
            trust_decay_rate: 0.01,
            resonance_threshold: 0.7,
            max_initial_connections: 7,
            trust_floor: 0.1,
            connection_trust_increment: 0.05,
            collective_trust_bonus: 0.02,
            sacred_trust_bonus: 0.01,
            field_update_delta: 0.1,
            inactivity_threshold_ms: 600_000,
            active_window_ms: 300_000,
            max_pending_events: 4096,
        }
    }
}

impl NetworkConfig {
    pub fn with_max_agents(mut self, max: usize) -> Self {
        self.max_agents = max;
        self
    }

    pub fn with_min_trust_for_connection(mut self, trust: f64) -> Self {
        self.min_trust_for_connection = trust;
        self
    }

    pub fn with_trust_decay_rate(mut self, rate: f64) -> Self {
        self.trust_decay_rate = rate;
        self
    }

    pub fn with_resonance_threshold(mut self, threshold: f64) -> Self {
        self.resonance_threshold = threshold;
        self
    }

    pub fn with_max_initial_connections(mut self, max: usize) -> Self {
        self.max_initial_connections = max;
        self
    }

    pub fn with_trust_floor(mut self, floor: f64) -> Self {
        self.trust_floor = floor;
        self
    }

    pub fn with_max_pending_events(mut self, max: usize) -> Self {
        self.max_pending_events = max;
        self
    }

    pub fn inactivity_threshold(&self) -> Duration {
        Duration::milliseconds(self.inactivity_threshold_ms)
    }

    pub fn active_window(&self) -> Duration {
        Duration::milliseconds(self.active_window_ms)
    }

    /// Check every value is in range
    pub fn validate(&self) -> Result<()> {
        let unit = [
            ("min_trust_for_connection", self.min_trust_for_connection),
            ("trust_decay_rate", self.trust_decay_rate),
            ("resonance_threshold", self.resonance_threshold),
            ("trust_floor", self.trust_floor),
            ("connection_trust_increment", self.connection_trust_increment),
            ("collective_trust_bonus", self.collective_trust_bonus),
            ("sacred_trust_bonus", self.sacred_trust_bonus),
            ("field_update_delta", self.field_update_delta),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(WeaveError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.max_agents == 0 {
            return Err(WeaveError::InvalidConfig("max_agents must be at least 1".into()));
        }
        if self.max_pending_events == 0 {
            return Err(WeaveError::InvalidConfig(
                "max_pending_events must be at least 1".into(),
            ));
        }
        if self.inactivity_threshold_ms < 0 || self.active_window_ms < 0 {
            return Err(WeaveError::InvalidConfig("durations must not be negative".into()));
        }
        Ok(())
    }
}
