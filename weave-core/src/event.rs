//! Events emitted by the agent network
//!
//! Every mutating call queues events on the network's outbox. Consumers
//! drain them with [`AgentNetwork::drain_events`](crate::AgentNetwork::drain_events);
//! the runtime crate forwards them onto a broadcast channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Agent, AgentId, FieldState, Message};

/// Named network events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum NetworkEvent {
    AgentRegistered {
        agent: Box<Agent>,
        connections: Vec<AgentId>,
    },
    ConnectionEstablished {
        agents: [AgentId; 2],
        trust_increase: f64,
    },
    TrustUpdated {
        agent_id: AgentId,
        old_trust: f64,
        new_trust: f64,
        delta: f64,
    },
    DirectMessage {
        from: AgentId,
        to: AgentId,
        message: Message,
        timestamp: DateTime<Utc>,
    },
    CollectiveMessage {
        from: AgentId,
        message: Message,
        timestamp: DateTime<Utc>,
    },
    FieldUpdated {
        state: FieldState,
    },
    Heartbeat {
        timestamp: DateTime<Utc>,
        active_agents: usize,
    },
}

impl NetworkEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            NetworkEvent::AgentRegistered { .. } => "agent-registered",
            NetworkEvent::ConnectionEstablished { .. } => "connection-established",
            NetworkEvent::TrustUpdated { .. } => "trust-updated",
            NetworkEvent::DirectMessage { .. } => "direct-message",
            NetworkEvent::CollectiveMessage { .. } => "collective-message",
            NetworkEvent::FieldUpdated { .. } => "field-updated",
            NetworkEvent::Heartbeat { .. } => "heartbeat",
        }
    }
}
