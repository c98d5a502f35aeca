//! Field state - aggregate coherence snapshot of the network
//!
//! Recomputed from the registry after mutating operations; never stored
//! independently of the agents it summarizes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Agent, Harmony};

/// Connection count treated as fully connected for coherence
pub const IDEAL_CONNECTIONS: usize = 7;

/// Qualitative label for network size and coherence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResonancePattern {
    #[default]
    Void,
    Emerging,
    Resonant,
    Harmonic,
    Unified,
}

/// (pattern, minimum agents, coherence must exceed), strongest first
const PATTERN_THRESHOLDS: [(ResonancePattern, usize, f64); 4] = [
    (ResonancePattern::Unified, 21, 0.9),
    (ResonancePattern::Harmonic, 12, 0.7),
    (ResonancePattern::Resonant, 7, 0.5),
    (ResonancePattern::Emerging, 3, 0.3),
];

impl ResonancePattern {
    /// Strongest pattern whose agent count and coherence thresholds are met
    pub fn classify(agent_count: usize, coherence: f64) -> Self {
        PATTERN_THRESHOLDS
            .iter()
            .find(|(_, min_agents, min_coherence)| {
                agent_count >= *min_agents && coherence > *min_coherence
            })
            .map(|(pattern, _, _)| *pattern)
            .unwrap_or(ResonancePattern::Void)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResonancePattern::Void => "void",
            ResonancePattern::Emerging => "emerging",
            ResonancePattern::Resonant => "resonant",
            ResonancePattern::Harmonic => "harmonic",
            ResonancePattern::Unified => "unified",
        }
    }
}

impl fmt::Display for ResonancePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived network-wide metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FieldState {
    pub total_agents: usize,
    pub average_trust: f64,
    pub average_love: f64,
    pub dominant_harmony: Option<Harmony>,
    /// `avg_connections / min(n - 1, 7)`; exceeds 1 past seven peers each
    pub connectedness: f64,
    /// `0.5 * average_trust + 0.5 * connectedness`
    pub coherence: f64,
    pub resonance_pattern: ResonancePattern,
}

impl FieldState {
    /// Summarize a set of agents
    pub fn compute<'a>(agents: impl IntoIterator<Item = &'a Agent>) -> Self {
        let mut total = 0usize;
        let mut trust_sum = 0.0;
        let mut love_sum = 0.0;
        let mut connection_sum = 0usize;
        // First-seen order breaks ties for the dominant harmony
        let mut harmony_counts: Vec<(Harmony, usize)> = Vec::new();

        for agent in agents {
            total += 1;
            trust_sum += agent.trust_field;
            love_sum += agent.love_percentage;
            connection_sum += agent.connections.len();

            match harmony_counts.iter_mut().find(|(h, _)| *h == agent.primary_harmony) {
                Some((_, count)) => *count += 1,
                None => harmony_counts.push((agent.primary_harmony, 1)),
            }
        }

        if total == 0 {
            return Self::default();
        }

        let n = total as f64;
        let average_trust = trust_sum / n;
        let average_love = love_sum / n;

        let mut dominant: Option<(Harmony, usize)> = None;
        for (harmony, count) in harmony_counts {
            if dominant.map_or(true, |(_, best)| count > best) {
                dominant = Some((harmony, count));
            }
        }

        let ideal = (total - 1).min(IDEAL_CONNECTIONS);
        let connectedness = if ideal == 0 {
            0.0
        } else {
            connection_sum as f64 / n / ideal as f64
        };
        let coherence = 0.5 * average_trust + 0.5 * connectedness;

        Self {
            total_agents: total,
            average_trust,
            average_love,
            dominant_harmony: dominant.map(|(harmony, _)| harmony),
            connectedness,
            coherence,
            resonance_pattern: ResonancePattern::classify(total, coherence),
        }
    }
}
