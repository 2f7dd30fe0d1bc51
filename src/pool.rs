//! The entropy-pool bank: an ordered, append-only sequence of streaming
//! SHA-256 accumulators, plus the per-source round-robin router state.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// A single streaming SHA-256 accumulator. Never finalized except during a
/// reseed draw from this slot; drawing replaces it with a fresh instance.
pub(crate) struct HashPool {
    hasher: Sha256,
}

impl HashPool {
    fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Feed raw bytes into the pool.
    pub(crate) fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Feed a sequence of `u32` words, little-endian, into the pool.
    pub(crate) fn update_words(&mut self, words: &[u32]) {
        for w in words {
            self.hasher.update(w.to_le_bytes());
        }
    }

    /// Finalize the pool, returning its 256-bit digest, and replace it with
    /// a fresh empty accumulator.
    fn drain(&mut self) -> [u8; 32] {
        let finished = std::mem::replace(&mut self.hasher, Sha256::new());
        finished.finalize().into()
    }
}

/// The ordered pool bank plus per-source round-robin routing state.
pub(crate) struct PoolBank {
    pools: Vec<HashPool>,
    pool_bits: Vec<u64>,
    robins: HashMap<String, usize>,
    source_ids: HashMap<String, u32>,
}

impl PoolBank {
    /// A fresh bank starts with exactly one pool (I1: `len >= 1`).
    pub(crate) fn new() -> Self {
        Self {
            pools: vec![HashPool::new()],
            pool_bits: vec![0],
            robins: HashMap::new(),
            source_ids: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pools.len()
    }

    pub(crate) fn pool_bits(&self) -> &[u64] {
        &self.pool_bits
    }

    pub(crate) fn pool0_bits(&self) -> u64 {
        self.pool_bits[0]
    }

    pub(crate) fn total_bits(&self) -> u64 {
        self.pool_bits.iter().sum()
    }

    /// Resolve, allocating on first sight, the dense source id for `tag`.
    pub(crate) fn source_id(&mut self, tag: &str) -> u32 {
        if let Some(id) = self.source_ids.get(tag) {
            return *id;
        }
        let id = self.source_ids.len() as u32;
        self.source_ids.insert(tag.to_owned(), id);
        id
    }

    /// Return the pool index to route this submission to, then advance the
    /// round-robin cursor modulo the current pool count.
    pub(crate) fn next_robin(&mut self, tag: &str) -> usize {
        let len = self.pools.len();
        let slot = self.robins.entry(tag.to_owned()).or_insert(0);
        let current = *slot % len;
        *slot = (current + 1) % len;
        current
    }

    pub(crate) fn robin_for(&self, tag: &str) -> usize {
        self.robins.get(tag).copied().unwrap_or(0)
    }

    pub(crate) fn pool_mut(&mut self, idx: usize) -> &mut HashPool {
        &mut self.pools[idx]
    }

    pub(crate) fn add_bits(&mut self, idx: usize, bits: u64) {
        self.pool_bits[idx] += bits;
    }

    /// Append a fresh, empty pool with a zero bit counter.
    pub(crate) fn grow(&mut self) {
        self.pools.push(HashPool::new());
        self.pool_bits.push(0);
        log::debug!("pool bank grew to {} pools", self.pools.len());
    }

    /// Drain pool `idx`'s digest and zero its bit counter, returning the
    /// bits that were resident so the caller can fold them into `strength`.
    pub(crate) fn drain(&mut self, idx: usize) -> ([u8; 32], u64) {
        let digest = self.pools[idx].drain();
        let bits = std::mem::replace(&mut self.pool_bits[idx], 0);
        (digest, bits)
    }
}

impl Drop for PoolBank {
    fn drop(&mut self) {
        self.pool_bits.zeroize();
    }
}
