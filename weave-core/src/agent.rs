//! Agent primitive - participants in the Weave network
//!
//! Agents are created from an [`AgentProfile`] at registration and keep their
//! descriptive fields for life. Trust and activity are the mutable parts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::{Result, WeaveError};

/// Unique identifier for an agent (a HIPI string)
pub type AgentId = String;

/// Default love percentage when the profile omits one
pub const DEFAULT_LOVE_PERCENTAGE: f64 = 75.0;

/// Default consciousness level when the profile omits one
pub const DEFAULT_CONSCIOUSNESS_LEVEL: f64 = 0.1;

/// Primary harmony tag used for resonance scoring
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Harmony {
    Coherence,
    #[default]
    Resonance,
    Vitality,
    Mutuality,
    Novelty,
    Agency,
    Transparency,
    Emergence,
}

impl Harmony {
    pub const ALL: [Harmony; 8] = [
        Harmony::Coherence,
        Harmony::Resonance,
        Harmony::Vitality,
        Harmony::Mutuality,
        Harmony::Novelty,
        Harmony::Agency,
        Harmony::Transparency,
        Harmony::Emergence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Harmony::Coherence => "coherence",
            Harmony::Resonance => "resonance",
            Harmony::Vitality => "vitality",
            Harmony::Mutuality => "mutuality",
            Harmony::Novelty => "novelty",
            Harmony::Agency => "agency",
            Harmony::Transparency => "transparency",
            Harmony::Emergence => "emergence",
        }
    }

    /// Harmonies listed as complementary to this one
    fn complements(&self) -> &'static [Harmony] {
        match self {
            Harmony::Coherence => &[Harmony::Transparency, Harmony::Resonance],
            Harmony::Resonance => &[Harmony::Mutuality, Harmony::Coherence],
            Harmony::Vitality => &[Harmony::Novelty, Harmony::Agency],
            Harmony::Mutuality => &[Harmony::Resonance, Harmony::Transparency],
            Harmony::Novelty => &[Harmony::Vitality, Harmony::Emergence],
            Harmony::Agency => &[Harmony::Transparency, Harmony::Vitality],
            Harmony::Transparency => &[Harmony::Coherence, Harmony::Agency],
            Harmony::Emergence => &[],
        }
    }

    /// Whether either harmony lists the other as complementary
    pub fn is_complementary(&self, other: &Harmony) -> bool {
        self.complements().contains(other) || other.complements().contains(self)
    }
}

impl fmt::Display for Harmony {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Harmony {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Harmony::ALL
            .iter()
            .copied()
            .find(|h| h.as_str() == wanted)
            .ok_or_else(|| WeaveError::InvalidProfile(format!("unknown harmony: {s}")))
    }
}

impl TryFrom<String> for Harmony {
    type Error = WeaveError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Caller-supplied description of an agent joining the network
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub love_percentage: Option<f64>,
    #[serde(default)]
    pub primary_harmony: Option<Harmony>,
    #[serde(default)]
    pub consciousness_level: Option<f64>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            ..Default::default()
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_love(mut self, love_percentage: f64) -> Self {
        self.love_percentage = Some(love_percentage);
        self
    }

    pub fn with_harmony(mut self, harmony: Harmony) -> Self {
        self.primary_harmony = Some(harmony);
        self
    }

    pub fn with_consciousness(mut self, level: f64) -> Self {
        self.consciousness_level = Some(level);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Reject profiles without a name or role
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(WeaveError::InvalidProfile("agent must have a name".into()));
        }
        if self.role.trim().is_empty() {
            return Err(WeaveError::InvalidProfile("agent must have a role".into()));
        }
        Ok(())
    }

    pub fn harmony(&self) -> Harmony {
        self.primary_harmony.unwrap_or_default()
    }

    pub fn love(&self) -> f64 {
        self.love_percentage
            .unwrap_or(DEFAULT_LOVE_PERCENTAGE)
            .clamp(0.0, 100.0)
    }

    pub fn consciousness(&self) -> f64 {
        self.consciousness_level
            .unwrap_or(DEFAULT_CONSCIOUSNESS_LEVEL)
            .clamp(0.0, 1.0)
    }
}

/// A registered agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub role: String,
    pub capabilities: BTreeSet<String>,
    /// Accrued trust, always within [0, 1]
    pub trust_field: f64,
    pub love_percentage: f64,
    pub primary_harmony: Harmony,
    pub consciousness_level: f64,
    pub joined_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    /// Peer ids; kept symmetric by the network
    pub connections: BTreeSet<AgentId>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Agent {
    /// Build an agent from a validated profile
    pub fn from_profile(
        id: AgentId,
        profile: AgentProfile,
        trust: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            love_percentage: profile.love(),
            primary_harmony: profile.harmony(),
            consciousness_level: profile.consciousness(),
            name: profile.name,
            role: profile.role,
            capabilities: profile.capabilities,
            trust_field: trust.clamp(0.0, 1.0),
            joined_at: now,
            last_active_at: now,
            connections: BTreeSet::new(),
            metadata: profile.metadata,
        }
    }

    pub fn is_connected_to(&self, other: &str) -> bool {
        self.connections.contains(other)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active_at = now;
    }

    /// Time since the agent last sent or received a message
    pub fn inactive_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_active_at
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}
