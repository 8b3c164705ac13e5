//! In-memory blockchain whose blocks are sealed by SHA-256 proof-of-work,
//! served over a small HTTP API.

pub mod api;
pub mod blockchain;
pub mod config;
