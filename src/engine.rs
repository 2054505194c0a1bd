//! Allocation engine
//!
//! [`MemoryManager`] owns the block ledger and is the only component that
//! mutates it. It wires the active placement policy to the ledger's
//! split/merge mutators, tracks the used-memory counter and the next-fit
//! cursor, and derives the external-fragmentation statistic. Display layers
//! consume read-only snapshots via [`blocks`](MemoryManager::blocks) and
//! [`stats`](MemoryManager::stats).

use crate::block::{BlockSnapshot, MemoryBlock};
use crate::error::{MemSimError, Result};
use crate::layout::SeedLayout;
use crate::ledger::BlockLedger;
use crate::policy::{self, PlacementPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Snapshot of the memory counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Fixed size of the address space (KB)
    pub total: u64,
    /// KB currently allocated
    pub used: u64,
    /// KB currently free
    pub free: u64,
    /// External fragmentation, percent of free memory outside the largest
    /// free block
    pub fragmentation: f64,
}

/// Contiguous-memory allocation engine
///
/// Every public operation is atomic with respect to observable state: it
/// either applies fully or rejects without touching the ledger, counters,
/// or cursor.
#[derive(Debug, Clone)]
pub struct MemoryManager {
    ledger: BlockLedger,
    policy: PlacementPolicy,

    /// Next-fit scan position; reset on `reset()` and on policy switch
    next_fit_cursor: usize,

    /// Running count of allocated KB
    used: u64,

    /// Pristine state restored by `reset()`
    seed_ledger: BlockLedger,
    seed_used: u64,
}

impl MemoryManager {
    /// Create an engine over the fixed boot layout, using first-fit
    pub fn new() -> Self {
        // The default layout is a validated constant
        Self::with_layout(SeedLayout::default()).expect("default seed layout is valid")
    }

    /// Create an engine over a custom seed layout
    pub fn with_layout(layout: SeedLayout) -> Result<Self> {
        let ledger = BlockLedger::from_layout(&layout)?;
        let used = layout.used_size();
        info!(
            "Memory initialized: total={} KB, used={} KB, {} blocks",
            ledger.total_size(),
            used,
            ledger.len()
        );
        Ok(MemoryManager {
            seed_ledger: ledger.clone(),
            seed_used: used,
            ledger,
            policy: PlacementPolicy::FirstFit,
            next_fit_cursor: 0,
            used,
        })
    }

    /// Restore the seed ledger, counters, and cursor
    pub fn reset(&mut self) {
        self.ledger = self.seed_ledger.clone();
        self.used = self.seed_used;
        self.next_fit_cursor = 0;
        info!("Memory reset to initial state");
    }

    /// Switch the placement algorithm
    ///
    /// Resets the next-fit cursor; never touches the ledger.
    pub fn set_policy(&mut self, policy: PlacementPolicy) {
        debug!("Switching policy {} -> {}", self.policy, policy);
        self.policy = policy;
        self.next_fit_cursor = 0;
    }

    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    /// Allocate `size` KB to `owner` using the active policy
    pub fn allocate(&mut self, size: u64, owner: &str) -> Result<()> {
        if size == 0 {
            return Err(MemSimError::InvalidSize(size));
        }
        if owner.is_empty() {
            return Err(MemSimError::InvalidOwner);
        }
        // Duplicate check comes before any policy search, regardless of
        // algorithm
        if self.ledger.owner_exists(owner) {
            return Err(MemSimError::DuplicateOwner(owner.to_string()));
        }

        let index = self
            .select(size)
            .ok_or(MemSimError::NoSuitableBlock { requested: size })?;

        self.ledger.split_at(index, size, owner)?;
        self.used += size;

        if self.policy == PlacementPolicy::NextFit {
            // Recomputed after the split since the ledger may have grown
            self.next_fit_cursor = (index + 1) % self.ledger.len();
        }

        debug_assert!(self.ledger.check_invariants().is_ok());
        info!(
            "Allocated {} KB to '{}' via {} (used {} of {} KB)",
            size,
            owner,
            self.policy,
            self.used,
            self.ledger.total_size()
        );
        Ok(())
    }

    /// Free every block owned by `owner` and coalesce
    ///
    /// Returns the total KB released.
    pub fn deallocate(&mut self, owner: &str) -> Result<u64> {
        if owner.is_empty() {
            return Err(MemSimError::InvalidOwner);
        }

        let released = self.ledger.release_owner(owner);
        if released == 0 {
            return Err(MemSimError::OwnerNotFound(owner.to_string()));
        }

        self.used -= released;
        self.ledger.merge_free();

        debug_assert!(self.ledger.check_invariants().is_ok());
        debug_assert!(self.ledger.check_coalesced().is_ok());
        info!(
            "Deallocated {} KB from '{}' (used {} of {} KB)",
            released,
            owner,
            self.used,
            self.ledger.total_size()
        );
        Ok(released)
    }

    /// Ordered view of the current blocks
    pub fn blocks(&self) -> &[MemoryBlock] {
        self.ledger.blocks()
    }

    /// Ordered snapshot shaped for display layers
    pub fn snapshot(&self) -> Vec<BlockSnapshot> {
        self.ledger.blocks().iter().map(BlockSnapshot::from).collect()
    }

    pub fn total_memory(&self) -> u64 {
        self.ledger.total_size()
    }

    pub fn used_memory(&self) -> u64 {
        self.used
    }

    pub fn free_memory(&self) -> u64 {
        self.ledger.total_size() - self.used
    }

    /// External fragmentation as a percentage in [0, 100]
    ///
    /// The share of free memory that sits outside the largest free block:
    /// free capacity that exists in total but cannot satisfy a request as
    /// large as that block.
    pub fn fragmentation(&self) -> f64 {
        let total_free = self.free_memory();
        if total_free == 0 {
            return 0.0;
        }

        let largest_free = self.ledger.largest_free();
        // Floored at 0; the invariants keep largest_free <= total_free
        let unusable = total_free.saturating_sub(largest_free);
        (unusable as f64 / total_free as f64) * 100.0
    }

    /// Counter snapshot for display layers
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            total: self.total_memory(),
            used: self.used,
            free: self.free_memory(),
            fragmentation: self.fragmentation(),
        }
    }

    /// Run the active policy over the current ledger
    fn select(&self, requested: u64) -> Option<usize> {
        let blocks = self.ledger.blocks();
        match self.policy {
            PlacementPolicy::FirstFit => policy::first_fit(blocks, requested),
            PlacementPolicy::BestFit => policy::best_fit(blocks, requested),
            PlacementPolicy::WorstFit => policy::worst_fit(blocks, requested),
            PlacementPolicy::NextFit => policy::next_fit(blocks, requested, self.next_fit_cursor),
        }
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new()
    }
}
