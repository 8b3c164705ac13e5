use log::{debug, trace, warn};
use sha2::{Digest, Sha256};

use super::{Block, ChainError};

/// Highest difficulty accepted. At 256 bits the target is 1, so only the
/// all-zero digest qualifies.
pub const MAX_DIFFICULTY_BITS: u32 = 256;

/// Number of nonces a full search may try: `0..=i64::MAX`.
pub const NONCE_SPACE: u64 = i64::MAX as u64 + 1;

/// Emit a progress line every this many attempts.
const PROGRESS_INTERVAL: u64 = 1 << 16;

/// Proof-of-work threshold `2^(256 - bits)`.
///
/// A digest read as a big-endian 256-bit integer meets the target when it is
/// strictly below it, which is the same as its `bits` most significant bits
/// all being zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    bits: u32,
}

impl Target {
    pub fn new(bits: u32) -> Result<Self, ChainError> {
        if bits > MAX_DIFFICULTY_BITS {
            return Err(ChainError::InvalidDifficulty(bits));
        }
        Ok(Self { bits })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub fn is_met_by(&self, hash: &[u8; 32]) -> bool {
        leading_zero_bits(hash) >= self.bits
    }

    /// Big-endian bytes of the target. `None` at 0 bits, where the target
    /// is `2^256` and does not fit in 32 bytes.
    pub fn to_bytes(&self) -> Option<[u8; 32]> {
        if self.bits == 0 {
            return None;
        }
        let exponent = (MAX_DIFFICULTY_BITS - self.bits) as usize;
        let mut target = [0u8; 32];
        target[31 - exponent / 8] = 1 << (exponent % 8);
        Some(target)
    }

    pub fn to_hex(&self) -> Option<String> {
        self.to_bytes().map(hex::encode)
    }
}

/// Count leading zero bits of a big-endian digest.
fn leading_zero_bits(hash: &[u8; 32]) -> u32 {
    let mut zeros = 0;
    for byte in hash {
        if *byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros
}

fn finalize(hasher: Sha256) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Binds a block to the target derived from a difficulty.
///
/// The hashed preimage is, with no delimiters:
/// `prev_block_hash ‖ data ‖ be64(timestamp) ‖ be64(difficulty_bits) ‖ be64(nonce)`.
/// This layout is what makes stored hashes reproducible, so it must not change.
#[derive(Debug, Clone, Copy)]
pub struct ProofOfWork<'a> {
    block: &'a Block,
    target: Target,
}

impl<'a> ProofOfWork<'a> {
    pub fn new(block: &'a Block, difficulty_bits: u32) -> Result<Self, ChainError> {
        Ok(Self {
            block,
            target: Target::new(difficulty_bits)?,
        })
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Full preimage for `nonce`.
    pub fn prepare_data(&self, nonce: u64) -> Vec<u8> {
        let mut data = self.header_without_nonce();
        data.extend_from_slice(&nonce.to_be_bytes());
        data
    }

    // Nonces never exceed i64::MAX, so the unsigned big-endian encoding is
    // identical to the signed one.
    fn header_without_nonce(&self) -> Vec<u8> {
        let block = self.block;
        let mut data =
            Vec::with_capacity(block.prev_block_hash.len() + block.data.len() + 3 * 8);
        data.extend_from_slice(&block.prev_block_hash);
        data.extend_from_slice(&block.data);
        data.extend_from_slice(&block.timestamp.to_be_bytes());
        data.extend_from_slice(&i64::from(self.target.bits()).to_be_bytes());
        data
    }

    /// SHA-256 of the preimage for `nonce`.
    pub fn compute_hash(&self, nonce: u64) -> [u8; 32] {
        finalize(Sha256::new().chain_update(self.prepare_data(nonce)))
    }

    /// Search the whole nonce space for a digest below the target.
    pub fn run(&self) -> Result<(u64, [u8; 32]), ChainError> {
        self.run_bounded(NONCE_SPACE)
    }

    /// Search nonces `0..max_attempts` (capped at the nonce space) and return
    /// the first `(nonce, hash)` meeting the target.
    pub fn run_bounded(&self, max_attempts: u64) -> Result<(u64, [u8; 32]), ChainError> {
        let attempts = max_attempts.min(NONCE_SPACE);
        let prefix = Sha256::new().chain_update(self.header_without_nonce());

        debug!(
            "mining block containing {:?} (difficulty_bits={}, budget={})",
            self.block.data_lossy(),
            self.target.bits(),
            attempts
        );

        for nonce in 0..attempts {
            let hash = finalize(prefix.clone().chain_update(nonce.to_be_bytes()));
            if nonce % PROGRESS_INTERVAL == 0 {
                trace!("nonce={} hash={}", nonce, hex::encode(hash));
            }
            if self.target.is_met_by(&hash) {
                debug!(
                    "found nonce {} after {} attempts: {}",
                    nonce,
                    nonce + 1,
                    hex::encode(hash)
                );
                return Ok((nonce, hash));
            }
        }

        warn!(
            "gave up mining {:?} after {} attempts",
            self.block.data_lossy(),
            attempts
        );
        Err(ChainError::NonceSpaceExhausted { attempts })
    }

    /// Recompute the digest from the stored fields and stored nonce and test
    /// it against the target. Does not look at the stored `hash`.
    pub fn meets_target(&self) -> bool {
        if self.block.nonce >= NONCE_SPACE {
            return false;
        }
        self.target.is_met_by(&self.compute_hash(self.block.nonce))
    }

    /// The stored `hash` equals the digest recomputed from the stored fields.
    pub fn hash_matches(&self) -> bool {
        self.block.hash.as_slice() == self.compute_hash(self.block.nonce).as_slice()
    }

    /// A block is valid when its stored nonce meets the target and its
    /// stored hash is the digest that nonce produces.
    pub fn validate(&self) -> bool {
        self.meets_target() && self.hash_matches()
    }
}
