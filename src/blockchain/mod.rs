pub mod block;
pub mod error;
pub mod model;
pub mod pow;

pub use block::{Block, BlockSummary, GENESIS_DATA};
pub use error::ChainError;
pub use model::Blockchain;
pub use pow::{MAX_DIFFICULTY_BITS, NONCE_SPACE, ProofOfWork, Target};

/// Default Proof-of-Work difficulty (leading zero bits of the block hash).
pub const DEFAULT_DIFFICULTY_BITS: u32 = 24;
