//! # Weave Runtime
//!
//! Async shell around the Weave agent network.
//!
//! Provides:
//! - A single `RwLock` guarding registry and topology together
//! - Event fan-out on a broadcast channel
//! - The periodic trust-decay heartbeat, with explicit shutdown

pub mod runtime;

pub use runtime::{RuntimeConfig, WeaveRuntime};
