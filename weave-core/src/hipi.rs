//! HIPI generator - Harmony-Integrated Presence Identifiers
//!
//! A HIPI is the externally visible address of an agent:
//!
//! ```text
//! hipi://weave::aria-lumen::resonance::3fa9c1e2-00002a9b41c7
//!        realm  name slug   harmony   profile  seq   noise
//! ```
//!
//! The sequence number makes every id from one generator distinct; the
//! profile fingerprint and random noise keep separate generators apart.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};

use crate::AgentProfile;

/// URI scheme prefix
pub const HIPI_SCHEME: &str = "hipi";

/// Default realm segment
pub const DEFAULT_REALM: &str = "weave";

const MAX_SLUG_LEN: usize = 24;

/// Identifier generator with an injectable randomness source
pub struct HipiGenerator {
    realm: String,
    rng: Box<dyn RngCore + Send + Sync>,
    sequence: u64,
}

impl HipiGenerator {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible generator for simulations and tests
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: impl RngCore + Send + Sync + 'static) -> Self {
        Self {
            realm: DEFAULT_REALM.to_string(),
            rng: Box::new(rng),
            sequence: 0,
        }
    }

    pub fn with_realm(mut self, realm: &str) -> Self {
        self.realm = slugify(realm);
        self
    }

    /// Number of identifiers issued so far
    pub fn issued(&self) -> u64 {
        self.sequence
    }

    /// Produce the next identifier for `profile`
    pub fn generate(&mut self, profile: &AgentProfile) -> String {
        self.sequence += 1;
        let noise = self.rng.next_u32() & 0x00ff_ffff;

        format!(
            "{HIPI_SCHEME}://{}::{}::{}::{}-{:06x}{:06x}",
            self.realm,
            slugify(&profile.name),
            profile.harmony(),
            profile_fingerprint(profile),
            self.sequence,
            noise,
        )
    }
}

impl Default for HipiGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HipiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HipiGenerator")
            .field("realm", &self.realm)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

/// First 8 hex chars of a SHA-256 over the profile's identifying fields
pub fn profile_fingerprint(profile: &AgentProfile) -> String {
    let mut hasher = Sha256::new();
    hasher.update(profile.name.as_bytes());
    hasher.update([0u8]);
    hasher.update(profile.role.as_bytes());
    hasher.update([0u8]);
    hasher.update(profile.harmony().as_str().as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    hash[..8].to_string()
}

/// Lowercase, dash-separated, ascii alphanumerics only
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let mut slug: String = slug.trim_end_matches('-').chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("agent");
    }
    slug
}
