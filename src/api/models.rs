use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::blockchain::{Block, BlockSummary, Blockchain, ChainError};
use crate::config::Config;

/// Shared application state: the in-memory chain and the mining budget.
pub struct AppState {
    pub blockchain: Mutex<Blockchain>,
    pub max_nonce_attempts: Option<u64>,
}

impl AppState {
    /// Mine the genesis block and wrap the chain for sharing across workers.
    pub fn new(difficulty_bits: u32, max_nonce_attempts: Option<u64>) -> Result<Self, ChainError> {
        Ok(Self::with_chain(
            Blockchain::new(difficulty_bits)?,
            max_nonce_attempts,
        ))
    }

    pub fn with_chain(blockchain: Blockchain, max_nonce_attempts: Option<u64>) -> Self {
        Self {
            blockchain: Mutex::new(blockchain),
            max_nonce_attempts,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ChainError> {
        Self::new(config.difficulty_bits, config.max_nonce_attempts)
    }
}

/* ---------- Block API Models ---------- */

#[derive(Deserialize)]
pub struct AddBlockRequest {
    pub data: String,
}

#[derive(Serialize)]
pub struct AddBlockResponse {
    pub index: usize,
    pub hash: String,
    pub prev_block_hash: String,
    pub nonce: u64,
    pub timestamp: i64,
}

impl AddBlockResponse {
    pub fn new(index: usize, block: &Block) -> Self {
        Self {
            index,
            hash: hex::encode(&block.hash),
            prev_block_hash: hex::encode(&block.prev_block_hash),
            nonce: block.nonce,
            timestamp: block.timestamp,
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty_bits: u32,
    pub blocks: Vec<BlockSummary>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty_bits: u32,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty_bits: u32,
    /// Hex target; `null` at 0 bits where it is 2^256.
    pub target: Option<String>,
}
