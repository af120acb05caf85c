//! # Shared Storage Block
//!
//! Reference-counted raw byte block holding the concatenated packed records
//! of one or more logical ledgers.
//!
//! A block is shared between ledger handles through `Arc`: the strong count
//! is the block's reference count, and `Arc::ptr_eq` exposes block identity
//! so sharing behavior stays observable in tests. A block is immutable from
//! the point of view of any handle that does not hold exclusive access
//! (strong count of exactly 1); handles gain exclusivity by allocating a
//! fresh block and copying their live prefix forward.
//!
//! Allocation is fallible and zero-initializing: a payload region that was
//! reserved but never written reads as zeroes.

use std::sync::{Arc, OnceLock};

use crate::error::{Result, TagError};

/// Smallest capacity handed out by the growth policy, so a run of small
/// appends does not reallocate on every call
pub(crate) const MIN_BLOCK_CAPACITY: usize = 64;

/// A fixed-capacity byte block shared between ledger handles.
pub(crate) struct StorageBlock {
    bytes: Vec<u8>,
}

impl StorageBlock {
    /// Allocate a zeroed block of exactly `capacity` bytes.
    pub(crate) fn allocate(capacity: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity)
            .map_err(|_| TagError::OutOfMemory(capacity))?;
        bytes.resize(capacity, 0);
        Ok(Self { bytes })
    }

    /// The globally shared zero-capacity sentinel block.
    ///
    /// Every empty ledger points here, so the sentinel is permanently shared
    /// and the first append on any empty ledger takes the unshare path
    /// (copying zero bytes).
    pub(crate) fn empty() -> Arc<Self> {
        static EMPTY: OnceLock<Arc<StorageBlock>> = OnceLock::new();
        Arc::clone(EMPTY.get_or_init(|| Arc::new(StorageBlock { bytes: Vec::new() })))
    }

    pub(crate) fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// Capacity for a block that must hold `needed` bytes, doubling the current
/// capacity for amortized growth.
pub(crate) fn grown_capacity(current: usize, needed: usize) -> usize {
    needed.max(current * 2).max(MIN_BLOCK_CAPACITY)
}
