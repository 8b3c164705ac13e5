use thiserror::Error;

/// Errors raised while building or extending a chain.
///
/// A stored block failing validation is not an error: validation returns
/// `false` and the caller decides what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The nonce search ran out of candidates without meeting the target.
    #[error("mining failed: no valid nonce after {attempts} attempts")]
    NonceSpaceExhausted { attempts: u64 },

    #[error("difficulty bits must be at most 256, got {0}")]
    InvalidDifficulty(u32),

    /// A premined block does not point at the current tip.
    #[error("block #{index} does not extend the tip (expected prev hash {expected:?}, found {found:?})")]
    BrokenLink {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("block #{index} fails proof-of-work validation")]
    InvalidProofOfWork { index: usize },
}
