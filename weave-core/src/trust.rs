//! Trust field calculator - bump and decay of per-agent trust
//!
//! All methods are pure: they take the current trust and return the new one.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{NetworkConfig, MAX_TRUST, MIN_TRUST};

/// Parameters for trust arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustFieldCalculator {
    /// Initial trust and lower bound for decay
    pub floor: f64,
    /// Amount removed per decay tick
    pub decay_rate: f64,
    /// Inactivity required before decay applies
    pub inactivity_threshold_ms: i64,
}

impl Default for TrustFieldCalculator {
    fn default() -> Self {
        Self {
            floor: 0.1,
            decay_rate: 0.01,
            inactivity_threshold_ms: 600_000,
        }
    }
}

impl TrustFieldCalculator {
    pub fn from_config(config: &NetworkConfig) -> Self {
        Self {
            floor: config.trust_floor,
            decay_rate: config.trust_decay_rate,
            inactivity_threshold_ms: config.inactivity_threshold_ms,
        }
    }

    /// Trust a newly registered agent starts with
    pub fn initial_trust(&self) -> f64 {
        self.floor.clamp(MIN_TRUST, MAX_TRUST)
    }

    /// Add `delta` and clamp to [0, 1]
    pub fn bump(current: f64, delta: f64) -> f64 {
        (current + delta).clamp(MIN_TRUST, MAX_TRUST)
    }

    /// One decay tick for an agent inactive for `inactive`
    pub fn decay_tick(&self, current: f64, inactive: Duration) -> f64 {
        Self::decay(
            current,
            inactive.num_milliseconds(),
            self.inactivity_threshold_ms,
            self.decay_rate,
            self.floor,
        )
    }

    /// Reduce trust by `rate` once inactivity exceeds `threshold_ms`
    ///
    /// Never drops below `floor`. Trust already at or under the floor is
    /// returned unchanged rather than raised.
    pub fn decay(current: f64, inactive_ms: i64, threshold_ms: i64, rate: f64, floor: f64) -> f64 {
        if inactive_ms <= threshold_ms || current <= floor {
            return current;
        }
        (current - rate.max(0.0)).max(floor)
    }

    /// Bucket label for a trust value
    pub fn bucket(trust: f64) -> TrustBucket {
        if trust < 0.3 {
            TrustBucket::Low
        } else if trust < 0.7 {
            TrustBucket::Medium
        } else {
            TrustBucket::High
        }
    }
}

/// Coarse trust ranges used in network statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustBucket {
    /// [0, 0.3)
    Low,
    /// [0.3, 0.7)
    Medium,
    /// [0.7, 1]
    High,
}
