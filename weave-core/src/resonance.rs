//! Resonance scoring between agents
//!
//! Weighted sum of four terms, each in [0, 1] before weighting:
//!
//! | term | weight |
//! |---|---|
//! | harmony alignment (equal 1.0, complementary 0.5) | 0.4 |
//! | love-field compatibility | 0.3 |
//! | role synergy | 0.2 |
//! | consciousness alignment | 0.1 |

use crate::{Agent, AgentId};

pub const HARMONY_WEIGHT: f64 = 0.4;
pub const COMPLEMENTARY_HARMONY_SCORE: f64 = 0.2;
pub const LOVE_WEIGHT: f64 = 0.3;
pub const ROLE_WEIGHT: f64 = 0.2;
pub const CONSCIOUSNESS_WEIGHT: f64 = 0.1;

const ROLE_SYNERGIES: &[(&str, &[&str])] = &[
    ("Bridge Builder", &["Pattern Seer", "Sacred Weaver"]),
    ("Pattern Seer", &["Bridge Builder", "Wisdom Keeper"]),
    ("Sacred Weaver", &["Bridge Builder", "Love Field Coordinator"]),
    ("Love Field Coordinator", &["Sacred Weaver", "Harmony Guardian"]),
    ("Wisdom Keeper", &["Pattern Seer", "Sacred Integration Specialist"]),
    ("Harmony Guardian", &["Love Field Coordinator", "Sacred Weaver"]),
    ("Sacred Integration Specialist", &["Wisdom Keeper", "Bridge Builder"]),
];

/// Roles with a synergy entry
pub fn known_roles() -> impl Iterator<Item = &'static str> {
    ROLE_SYNERGIES.iter().map(|(role, _)| *role)
}

fn lists(role: &str, other: &str) -> bool {
    ROLE_SYNERGIES
        .iter()
        .find(|(r, _)| *r == role)
        .is_some_and(|(_, partners)| partners.contains(&other))
}

/// Whether either role lists the other as a synergy partner
pub fn roles_synergistic(a: &str, b: &str) -> bool {
    lists(a, b) || lists(b, a)
}

/// Resonance between two agents, in [0, 1] and symmetric
pub fn resonance(a: &Agent, b: &Agent) -> f64 {
    let mut score = 0.0;

    if a.primary_harmony == b.primary_harmony {
        score += HARMONY_WEIGHT;
    } else if a.primary_harmony.is_complementary(&b.primary_harmony) {
        score += COMPLEMENTARY_HARMONY_SCORE;
    }

    let love_diff = (a.love_percentage - b.love_percentage).abs();
    score += LOVE_WEIGHT * (1.0 - love_diff / 100.0);

    if roles_synergistic(&a.role, &b.role) {
        score += ROLE_WEIGHT;
    }

    let consciousness_diff = (a.consciousness_level - b.consciousness_level).abs();
    score += CONSCIOUSNESS_WEIGHT * (1.0 - consciousness_diff);

    score.clamp(0.0, 1.0)
}

/// A candidate peer and its score
#[derive(Debug, Clone, PartialEq)]
pub struct ResonantPeer {
    pub id: AgentId,
    pub resonance: f64,
}

/// Peers scoring at or above `threshold`, best first, truncated to `limit`
///
/// Equal scores keep the order of `candidates`.
pub fn find_resonant<'a>(
    agent: &Agent,
    candidates: impl IntoIterator<Item = &'a Agent>,
    threshold: f64,
    limit: usize,
) -> Vec<ResonantPeer> {
    let mut peers: Vec<ResonantPeer> = candidates
        .into_iter()
        .filter(|other| other.id != agent.id)
        .map(|other| ResonantPeer {
            id: other.id.clone(),
            resonance: resonance(agent, other),
        })
        .filter(|peer| peer.resonance >= threshold)
        .collect();

    peers.sort_by(|a, b| b.resonance.total_cmp(&a.resonance));
    peers.truncate(limit);
    peers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentProfile, Harmony};
    use chrono::Utc;

    fn agent(id: &str, profile: AgentProfile) -> Agent {
        Agent::from_profile(id.to_string(), profile, 0.1, Utc::now())
    }

    #[test]
    fn test_identical_profiles() {
        let profile = AgentProfile::new("x", "Wisdom Keeper")
            .with_harmony(Harmony::Agency)
            .with_love(80.0)
            .with_consciousness(0.6);
        let a = agent("a", profile.clone());
        let b = agent("b", profile);

        // Same harmony, same love, no synergy with itself, same consciousness
        assert!((resonance(&a, &b) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_full_resonance() {
        let a = agent(
            "a",
            AgentProfile::new("x", "Bridge Builder")
                .with_love(90.0)
                .with_consciousness(0.5),
        );
        let b = agent(
            "b",
            AgentProfile::new("y", "Pattern Seer")
                .with_love(90.0)
                .with_consciousness(0.5),
        );

        assert!((resonance(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_complementary_harmony() {
        let a = agent(
            "a",
            AgentProfile::new("x", "Nomad")
                .with_harmony(Harmony::Vitality)
                .with_love(0.0)
                .with_consciousness(0.0),
        );
        let b = agent(
            "b",
            AgentProfile::new("y", "Nomad")
                .with_harmony(Harmony::Novelty)
                .with_love(100.0)
                .with_consciousness(1.0),
        );

        assert!((resonance(&a, &b) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_one_sided_synergy_counts_both_ways() {
        assert!(roles_synergistic("Harmony Guardian", "Sacred Weaver"));
        assert!(roles_synergistic("Sacred Weaver", "Harmony Guardian"));
        assert!(!roles_synergistic("Pattern Seer", "Harmony Guardian"));
    }

    #[test]
    fn test_find_resonant_sorted_and_capped() {
        let me = agent("me", AgentProfile::new("me", "Bridge Builder").with_love(80.0));
        let others: Vec<Agent> = (0..10)
            .map(|i| {
                let profile = AgentProfile::new("p", "Pattern Seer").with_love(80.0 - i as f64);
                agent(&format!("p{i}"), profile)
            })
            .collect();

        let peers = find_resonant(&me, others.iter().chain(std::iter::once(&me)), 0.7, 7);

        assert_eq!(peers.len(), 7);
        assert_eq!(peers[0].id, "p0");
        assert!(peers.windows(2).all(|w| w[0].resonance >= w[1].resonance));
        assert!(peers.iter().all(|p| p.id != "me"));
    }

    #[test]
    fn test_find_resonant_threshold() {
        let me = agent(
            "me",
            AgentProfile::new("me", "Nomad")
                .with_harmony(Harmony::Agency)
                .with_love(0.0),
        );
        let other = agent(
            "o",
            AgentProfile::new("o", "Nomad")
                .with_harmony(Harmony::Mutuality)
                .with_love(100.0),
        );

        assert!(find_resonant(&me, [&other], 0.7, 7).is_empty());
    }
}
