use std::borrow::Cow;
use std::fmt;

use chrono::Utc;
use serde::Serialize;

use super::ChainError;
use super::pow::{NONCE_SPACE, ProofOfWork};

/// Payload of the first block of every chain.
pub const GENESIS_DATA: &[u8] = b"Oasis";

/// A single block in the chain. Fields are filled once by mining and not
/// touched afterwards; the chain only hands out shared references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub timestamp: i64, // Unix timestamp (UTC)
    pub data: Vec<u8>,
    pub prev_block_hash: Vec<u8>, // empty for genesis
    pub hash: Vec<u8>,            // empty until mined
    pub nonce: u64,               // Proof-of-Work nonce
}

impl Block {
    /// Create and mine a block on top of `prev_block_hash`.
    pub fn new(
        data: impl Into<Vec<u8>>,
        prev_block_hash: Vec<u8>,
        difficulty_bits: u32,
    ) -> Result<Self, ChainError> {
        Self::with_timestamp(Utc::now().timestamp(), data, prev_block_hash).mine(difficulty_bits)
    }

    /// Create and mine the genesis block.
    pub fn genesis(difficulty_bits: u32) -> Result<Self, ChainError> {
        Self::new(GENESIS_DATA, Vec::new(), difficulty_bits)
    }

    /// Create an unmined candidate with a fixed timestamp.
    pub fn with_timestamp(
        timestamp: i64,
        data: impl Into<Vec<u8>>,
        prev_block_hash: Vec<u8>,
    ) -> Self {
        Self {
            timestamp,
            data: data.into(),
            prev_block_hash,
            hash: Vec::new(),
            nonce: 0,
        }
    }

    /// Run Proof-of-Work over the whole nonce space and seal the block.
    pub fn mine(self, difficulty_bits: u32) -> Result<Self, ChainError> {
        self.mine_bounded(difficulty_bits, NONCE_SPACE)
    }

    /// Same as [`Block::mine`] but gives up after `max_attempts` nonces.
    pub fn mine_bounded(mut self, difficulty_bits: u32, max_attempts: u64) -> Result<Self, ChainError> {
        let (nonce, hash) = ProofOfWork::new(&self, difficulty_bits)?.run_bounded(max_attempts)?;
        self.nonce = nonce;
        self.hash = hash.to_vec();
        Ok(self)
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_block_hash.is_empty()
    }

    /// Payload as text; invalid UTF-8 is replaced.
    pub fn data_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Check this block's Proof-of-Work at `difficulty_bits`. An out of
    /// range difficulty counts as invalid.
    pub fn is_valid(&self, difficulty_bits: u32) -> bool {
        ProofOfWork::new(self, difficulty_bits)
            .map(|pow| pow.validate())
            .unwrap_or(false)
    }
}

/// Printable audit view of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub prev_block_hash: String,
    pub data: String,
    pub hash: String,
    pub timestamp: i64,
    pub nonce: u64,
    pub pow: bool,
}

impl BlockSummary {
    pub fn new(block: &Block, difficulty_bits: u32) -> Self {
        Self {
            prev_block_hash: hex::encode(&block.prev_block_hash),
            data: block.data_lossy().into_owned(),
            hash: hex::encode(&block.hash),
            timestamp: block.timestamp,
            nonce: block.nonce,
            pow: block.is_valid(difficulty_bits),
        }
    }
}

impl fmt::Display for BlockSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Prev Hash:  {}", self.prev_block_hash)?;
        writeln!(f, "Data:       {}", self.data)?;
        writeln!(f, "Hash:       {}", self.hash)?;
        write!(f, "PoW:        {}", self.pow)
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, BlockSummary, GENESIS_DATA};
    use crate::blockchain::ChainError;
    use crate::blockchain::pow::ProofOfWork;

    const DIFFICULTY: u32 = 8;

    #[test]
    fn genesis_has_no_predecessor_and_valid_pow() {
        let b = Block::genesis(DIFFICULTY).unwrap();
        assert!(b.is_genesis());
        assert_eq!(b.data, GENESIS_DATA);
        assert_eq!(b.hash.len(), 32);
        assert!(b.is_valid(DIFFICULTY));
    }

    #[test]
    fn candidate_starts_unmined() {
        let b = Block::with_timestamp(42, "payload", vec![1, 2, 3]);
        assert!(b.hash.is_empty());
        assert_eq!(b.nonce, 0);
        assert_eq!(b.prev_block_hash, vec![1, 2, 3]);
        assert!(!b.is_valid(DIFFICULTY));
    }

    #[test]
    fn mining_stores_digest_of_winning_nonce() {
        let b = Block::new("Send 1BTC to Roger", vec![9; 32], DIFFICULTY).unwrap();
        let pow = ProofOfWork::new(&b, DIFFICULTY).unwrap();
        assert_eq!(b.hash, pow.compute_hash(b.nonce).to_vec());
        assert!(b.hash[0] == 0, "8 bits of difficulty means a zero first byte");
        assert!(b.is_valid(DIFFICULTY));
    }

    #[test]
    fn mining_keeps_timestamp_and_payload() {
        let b = Block::with_timestamp(1_700_000_000, "hello", Vec::new())
            .mine(DIFFICULTY)
            .unwrap();
        assert_eq!(b.timestamp, 1_700_000_000);
        assert_eq!(b.data, b"hello");
    }

    #[test]
    fn invalid_when_mutated() {
        let mut b = Block::new("Send 1BTC to Roger", vec![9; 32], DIFFICULTY).unwrap();
        let old_hash = b.hash.clone();

        b.data = b"Send 100BTC to Mallory".to_vec();

        let recomputed = ProofOfWork::new(&b, DIFFICULTY)
            .unwrap()
            .compute_hash(b.nonce);
        assert_ne!(old_hash, recomputed.to_vec());
        assert!(!b.is_valid(DIFFICULTY));
    }

    #[test]
    fn exhausted_budget_is_an_error() {
        let err = Block::with_timestamp(0, "x", Vec::new())
            .mine_bounded(64, 16)
            .unwrap_err();
        assert_eq!(err, ChainError::NonceSpaceExhausted { attempts: 16 });
    }

    #[test]
    fn out_of_range_difficulty_is_invalid() {
        let b = Block::genesis(DIFFICULTY).unwrap();
        assert!(!b.is_valid(300));
        assert_eq!(
            Block::genesis(300).unwrap_err(),
            ChainError::InvalidDifficulty(300)
        );
    }

    #[test]
    fn summary_renders_hex_and_text() {
        let genesis = Block::genesis(DIFFICULTY).unwrap();
        let b = Block::new("Send 1BTC to Roger", genesis.hash.clone(), DIFFICULTY).unwrap();
        let summary = BlockSummary::new(&b, DIFFICULTY);
        assert_eq!(summary.prev_block_hash, hex::encode(&genesis.hash));
        assert_eq!(summary.hash, hex::encode(&b.hash));
        assert_eq!(summary.data, "Send 1BTC to Roger");
        assert!(summary.pow);

        let text = summary.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], format!("Prev Hash:  {}", hex::encode(&genesis.hash)));
        assert_eq!(lines[1], "Data:       Send 1BTC to Roger");
        assert_eq!(lines[2], format!("Hash:       {}", hex::encode(&b.hash)));
        assert!(text.ends_with("PoW:        true"));
    }

    #[test]
    fn summary_of_genesis_has_empty_prev_hash() {
        let summary = BlockSummary::new(&Block::genesis(DIFFICULTY).unwrap(), DIFFICULTY);
        assert_eq!(summary.prev_block_hash, "");
        assert_eq!(summary.data, "Oasis");
    }
}
