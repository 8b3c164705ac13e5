use chrono::Utc;
use log::info;

use super::pow::{NONCE_SPACE, Target};
use super::{Block, BlockSummary, ChainError};

/// Simple in-memory blockchain with Proof-of-Work.
///
/// Append-only: blocks are only ever pushed, and callers get shared
/// references. The difficulty is fixed when the chain is created so every
/// block in it is mined and validated against the same target.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    target: Target,
}

impl Blockchain {
    /// Initialize a new blockchain with a mined genesis block.
    pub fn new(difficulty_bits: u32) -> Result<Self, ChainError> {
        let target = Target::new(difficulty_bits)?;
        let genesis = Block::genesis(difficulty_bits)?;
        info!(
            "genesis sealed (hash={}, nonce={}, difficulty_bits={})",
            hex::encode(&genesis.hash),
            genesis.nonce,
            difficulty_bits
        );
        Ok(Self {
            chain: vec![genesis],
            target,
        })
    }

    /// Start a chain from an already mined genesis block. The block must have
    /// no predecessor and validate at `difficulty_bits`.
    pub fn from_genesis(genesis: Block, difficulty_bits: u32) -> Result<Self, ChainError> {
        let target = Target::new(difficulty_bits)?;
        if !genesis.is_genesis() {
            return Err(ChainError::BrokenLink {
                index: 0,
                expected: String::new(),
                found: hex::encode(&genesis.prev_block_hash),
            });
        }
        if !genesis.is_valid(difficulty_bits) {
            return Err(ChainError::InvalidProofOfWork { index: 0 });
        }
        Ok(Self {
            chain: vec![genesis],
            target,
        })
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Mine and append a new block carrying `data`.
    pub fn add_block(&mut self, data: impl Into<Vec<u8>>) -> Result<&Block, ChainError> {
        self.add_block_bounded(data, NONCE_SPACE)
    }

    /// Mine and append a new block, giving up after `max_attempts` nonces.
    /// On error the chain is left untouched.
    pub fn add_block_bounded(
        &mut self,
        data: impl Into<Vec<u8>>,
        max_attempts: u64,
    ) -> Result<&Block, ChainError> {
        let block = self
            .candidate(data)
            .mine_bounded(self.difficulty_bits(), max_attempts)?;

        info!(
            "sealed block #{} (hash={}, nonce={})",
            self.chain.len(),
            hex::encode(&block.hash),
            block.nonce
        );
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// Unmined block on top of the current tip, stamped now. Mine it with
    /// [`Block::mine_bounded`] at [`Blockchain::difficulty_bits`] and hand it
    /// back through [`Blockchain::append_premined_block`].
    pub fn candidate(&self, data: impl Into<Vec<u8>>) -> Block {
        Block::with_timestamp(
            Utc::now().timestamp(),
            data,
            self.last_block().hash.clone(),
        )
    }

    /// Append a block mined elsewhere. It must point at the current tip and
    /// validate at this chain's difficulty; a block mined at any other
    /// difficulty fails that check.
    pub fn append_premined_block(&mut self, block: Block) -> Result<&Block, ChainError> {
        let index = self.chain.len();
        let tip_hash = &self.last_block().hash;
        if &block.prev_block_hash != tip_hash {
            return Err(ChainError::BrokenLink {
                index,
                expected: hex::encode(tip_hash),
                found: hex::encode(&block.prev_block_hash),
            });
        }
        if !block.is_valid(self.difficulty_bits()) {
            return Err(ChainError::InvalidProofOfWork { index });
        }

        info!(
            "accepted premined block #{} (hash={})",
            index,
            hex::encode(&block.hash)
        );
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// Blocks from genesis to tip. Borrowing the chain keeps it unchanged
    /// while iterating, and each call starts over from genesis.
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.chain.iter()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.chain.get(index)
    }

    /// Proof-of-Work check of the stored block at `index`.
    pub fn validate_block(&self, index: usize) -> bool {
        self.get(index)
            .is_some_and(|block| block.is_valid(self.difficulty_bits()))
    }

    /// Validate the entire chain: genesis, linkage, hashes and PoW.
    pub fn is_valid_chain(&self) -> bool {
        let Some(genesis) = self.chain.first() else {
            return false;
        };
        if !genesis.is_genesis() || !genesis.is_valid(self.difficulty_bits()) {
            return false;
        }

        self.chain
            .iter()
            .skip(1)
            .zip(self.chain.iter())
            .all(|(current, prev)| {
                current.prev_block_hash == prev.hash && current.is_valid(self.difficulty_bits())
            })
    }

    /// Audit view of every block, oldest first.
    pub fn summaries(&self) -> Vec<BlockSummary> {
        self.iter()
            .map(|block| BlockSummary::new(block, self.difficulty_bits()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: a chain holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty_bits(&self) -> u32 {
        self.target.bits()
    }

    pub fn target(&self) -> Target {
        self.target
    }
}

impl<'a> IntoIterator for &'a Blockchain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
