//! Injectable secure randomness.
//!
//! Every per-message secret (ephemeral key, salt) and every generated VAPID
//! key is drawn through [`EntropySource`]. Production code uses [`OsEntropy`];
//! tests substitute a source that replays fixed bytes so published test
//! vectors can be reproduced exactly.

// Rust guideline compliant 2026-10

use p256::elliptic_curve::rand_core::{OsRng, RngCore};
use p256::SecretKey;

use crate::constants::PRIVATE_KEY_LEN;
use crate::error::{Error, Result};

/// Candidate scalars drawn before giving up on key generation.
///
/// A uniformly random 32-byte value is outside `[1, n)` with probability
/// about 2^-32, so running out means the source is broken.
const MAX_SCALAR_ATTEMPTS: usize = 16;

/// A cryptographically secure random byte source.
///
/// Implementations must be safe to share across threads: concurrent sends
/// all draw from the same source.
pub trait EntropySource: Send + Sync + std::fmt::Debug {
    /// Fill `dest` entirely with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::Entropy(e.to_string()))
    }
}

/// Draw a P-256 secret scalar by rejection sampling.
///
/// Candidates are read as 32-byte big-endian integers and discarded until one
/// lands in `[1, n)`.
pub fn random_secret_key(rng: &dyn EntropySource) -> Result<SecretKey> {
    let mut candidate = zeroize::Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
    for _ in 0..MAX_SCALAR_ATTEMPTS {
        rng.fill(candidate.as_mut_slice())?;
        if let Ok(secret) = SecretKey::from_slice(candidate.as_slice()) {
            return Ok(secret);
        }
    }
    Err(Error::Entropy(
        "no valid P-256 scalar after repeated draws".to_string(),
    ))
}
