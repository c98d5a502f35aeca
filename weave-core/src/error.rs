//! Error types for the Weave core

use thiserror::Error;

/// Result type alias using WeaveError
pub type Result<T> = std::result::Result<T, WeaveError>;

/// Errors that can occur in agent network operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeaveError {
    /// Registration profile is missing a required field
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Registry already holds `max_agents` agents
    #[error("Network at maximum capacity ({max} agents)")]
    CapacityExceeded { max: usize },

    /// Referenced agent does not exist
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Direct message blocked by trust policy
    #[error("Insufficient trust from {from} to {to}: {trust:.3} < {required:.3}")]
    InsufficientTrust {
        from: String,
        to: String,
        trust: f64,
        required: f64,
    },

    /// Identifier already present in the registry
    #[error("Duplicate agent id: {0}")]
    DuplicateId(String),

    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
