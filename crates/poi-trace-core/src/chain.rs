//! Rolling hash chain over the ordered event sequence
//!
//! The chain digest is a function of the full ordered history: reordering,
//! inserting, or deleting any past event changes every subsequent digest.

use crate::canonical::{hash_domain_value, Domain};
use serde_json::json;

/// Chain state before any event has been absorbed
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Rolling digest over an ordered sequence of event hashes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashChain {
    current: String,
    item_count: u64,
}

impl HashChain {
    /// Start a fresh chain at the genesis digest
    pub fn new() -> Self {
        Self {
            current: GENESIS_HASH.to_string(),
            item_count: 0,
        }
    }

    /// One chain step: `roll(prev, eventHash, itemCount)`
    pub fn step(prev: &str, event_hash: &str, item_count: u64) -> String {
        hash_domain_value(
            Domain::Roll,
            &json!({
                "prev": prev,
                "eventHash": event_hash,
                "itemCount": item_count,
            }),
        )
    }

    /// Absorb the next event hash into the chain
    pub fn absorb(&mut self, event_hash: &str) {
        self.current = Self::step(&self.current, event_hash, self.item_count);
        self.item_count += 1;
    }

    /// Current chain digest
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Number of event hashes absorbed so far
    pub fn item_count(&self) -> u64 {
        self.item_count
    }
}

impl Default for HashChain {
    fn default() -> Self {
        Self::new()
    }
}
