//! # Weave Core
//!
//! In-memory network of agents connected by resonance and gated by trust.
//!
//! ## Core Concepts
//!
//! - **Agent**: a registered participant, addressed by its HIPI
//! - **Resonance**: weighted similarity between two agent profiles
//! - **Trust field**: per-agent scalar raised by interaction, decayed by idleness
//! - **Topology**: the undirected connection graph and its structural queries
//! - **Field state**: aggregate coherence snapshot of the whole network
//!
//! ## Example
//!
//! ```rust
//! use weave_core::{AgentNetwork, AgentProfile, Message, NetworkConfig, COLLECTIVE};
//!
//! let mut network = AgentNetwork::new(NetworkConfig::default()).unwrap();
//!
//! let aria = network
//!     .register_agent(AgentProfile::new("Aria", "Bridge Builder").with_love(90.0))
//!     .unwrap();
//! let kai = network
//!     .register_agent(AgentProfile::new("Kai", "Pattern Seer").with_love(90.0))
//!     .unwrap();
//! assert_eq!(kai.connections, vec![aria.id.clone()]);
//!
//! let delivery = network
//!     .send_message(&aria.id, COLLECTIVE, Message::text("hello, weave"))
//!     .unwrap();
//! assert_eq!(delivery.recipients, Some(1));
//! ```

pub mod agent;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod field;
pub mod hipi;
pub mod network;
pub mod registry;
pub mod resonance;
pub mod topology;
pub mod trust;

pub use agent::{Agent, AgentId, AgentProfile, Harmony};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::NetworkConfig;
pub use error::{Result, WeaveError};
pub use event::NetworkEvent;
pub use field::{FieldState, ResonancePattern};
pub use hipi::HipiGenerator;
pub use network::{
    AgentNetwork, AgentStats, Delivery, HeartbeatReport, Message, NetworkStats, Recipient,
    Registration, TrustDistribution, TrustStats, COLLECTIVE,
};
pub use registry::AgentRegistry;
pub use resonance::{resonance, ResonantPeer};
pub use topology::{Cluster, Path, Topology, TopologyAnalysis};
pub use trust::{TrustBucket, TrustFieldCalculator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lowest trust value
pub const MIN_TRUST: f64 = 0.0;

/// Highest trust value
pub const MAX_TRUST: f64 = 1.0;
